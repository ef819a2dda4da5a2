//! Command-line interface for deadlines.
//!
//! Every subcommand opens the tracker in the data directory, performs one
//! action and prints the result. Data goes to stdout (pretty JSON with
//! `--json`), warnings and errors to stderr.

mod run;


pub use run::{run, CliOutput};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Track assignment deadlines with cover images.
///
/// Data lives in `$DEADLINES_DATA_DIR`, or the platform data directory.
#[derive(Parser, Debug)]
#[command(name = "deadlines")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a task.
    ///
    /// Give either an exact `--date`, or a `--month` plus `--part` for a
    /// rough deadline (early = 10th, middle = 20th, late = last day).
    Add {
        /// Task title (required)
        #[arg(short, long)]
        title: String,

        /// Exact deadline, YYYY-MM-DD
        #[arg(long, conflicts_with = "month")]
        date: Option<String>,

        /// Rough deadline month, YYYY-MM
        #[arg(long)]
        month: Option<String>,

        /// Part of the month: early (default), middle or late
        #[arg(long, requires = "month")]
        part: Option<String>,

        /// Where the deliverable is handed in
        #[arg(long)]
        submit_to: Option<String>,

        /// Cover image file (PNG or JPEG)
        #[arg(long)]
        cover: Option<PathBuf>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// View scope the task is added from
        #[arg(long)]
        scope: Option<String>,
    },

    /// List tasks in a view scope.
    List {
        /// Scope: active, archive, all or tag
        #[arg(short, long)]
        scope: Option<String>,

        /// Tag to filter by (implies `--scope tag`)
        #[arg(long)]
        tag: Option<String>,

        /// Output the list view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one task in detail.
    Show {
        /// Task ID
        id: i64,

        /// Output the task card as JSON
        #[arg(long)]
        json: bool,
    },

    /// Toggle a task between complete and incomplete.
    Complete {
        /// Task ID
        id: i64,
    },

    /// Move a task to or from the archive.
    Archive {
        /// Task ID
        id: i64,
    },

    /// Set a task's progress (shown clamped to 0..=100).
    Progress {
        /// Task ID
        id: i64,

        /// Progress percentage
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Delete a task and its cover image.
    Delete {
        /// Task ID
        id: i64,
    },

    /// Export a stored cover image.
    Image {
        /// Image ID
        id: i64,

        /// File to write
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Ensure config file exists (create with defaults if not).
    #[command(name = "ensure-config")]
    EnsureConfig,

    /// Show version information.
    Version,
}
