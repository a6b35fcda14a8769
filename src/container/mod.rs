//! The `.sipped` container: a bare sequence of self-describing entries.

mod error;
pub mod format;
mod reader;

pub use error::ContainerError;
pub use format::{archive_file_name, ArchiveEntry, ARCHIVE_EXTENSION};
pub use reader::{ContainerReader, RawEntry};
