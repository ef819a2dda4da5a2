//! Cover image storage and compression.

pub mod compress;
pub mod store;

pub use compress::{compress, CompressOptions, MimeType};
pub use store::{ImageRecord, ImageStore, SqliteImageStore, SCHEMA_VERSION};
