//! Error types for `deadlines`.

use crate::form::ValidationError;

/// Errors that can occur while tracking deadlines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An image could not be decoded or re-encoded.
    #[error("Image conversion failed: {0}")]
    Image(#[from] image::ImageError),

    /// User input was rejected before anything was stored.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Writing the task collection would exceed the storage quota.
    #[error(
        "Storage quota exceeded ({needed} bytes needed, {quota} allowed); \
         try a smaller cover image"
    )]
    QuotaExceeded {
        /// Size of the rejected value in bytes.
        needed: usize,
        /// Configured quota in bytes.
        quota: usize,
    },

    /// No task with the given id exists.
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// Every id after the largest stored one is out of range.
    #[error("No task id available after {0}")]
    IdOverflow(i64),

    /// No image with the given id exists.
    #[error("Image not found: {0}")]
    ImageNotFound(i64),

    /// An unknown view scope name was given.
    #[error("invalid scope: '{0}' (must be one of: active, archive, all, tag)")]
    InvalidScope(String),

    /// The configuration is unusable.
    #[error("Config error: {0}")]
    Config(String),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
