use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Filename too long: {path} is {len} bytes (max {max})")]
    FilenameTooLong { path: String, len: usize, max: usize },

    #[error("Invalid entry path {path:?}: {reason}")]
    InvalidEntryPath { path: String, reason: String },
}

impl DomainError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntryPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
