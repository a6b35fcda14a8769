//! Errors surfaced by the archive use cases.
//!
//! Every variant that concerns a file or entry names it, so the binary can
//! report the failing path without extra context.

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;
use crate::container::ContainerError;
use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Codec error in {path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: CodecError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ArchiveError {
    /// Map an I/O error on `path` into an `ArchiveError`.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn codec(path: impl Into<String>) -> impl FnOnce(CodecError) -> Self {
        let path = path.into();
        move |source| Self::Codec { path, source }
    }

    /// Whether the error means the archive bytes are malformed, at the
    /// framing level or inside one entry's payload.
    pub fn is_corrupt_stream(&self) -> bool {
        matches!(
            self,
            Self::Container(_)
                | Self::Codec {
                    source: CodecError::CorruptStream(_),
                    ..
                }
        )
    }
}
