//! # `deadlines`
//!
//! A local deadline tracker. Tasks carry an exact or rough ("early/middle/late
//! of a month") deadline, a progress percentage, an optional submission target
//! and an optional cover image. Tasks are kept in a single JSON collection in
//! a `SQLite` key/value table; cover images are compressed and stored as blobs
//! in a second database.
//!
//! The [`tracker::Tracker`] ties the pieces together; the `deadlines` binary
//! (feature `cli`) is a thin front end over it.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod images;
pub mod logging;
pub mod paths;
pub mod render;
pub mod tasks;
pub mod tracker;
pub mod view;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
