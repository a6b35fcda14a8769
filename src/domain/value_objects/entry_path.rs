use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

/// Validated archive-relative path of one file (e.g. "docs/guide/intro.md").
///
/// Always UTF-8, `/`-separated, 1-256 bytes, never absolute, free of `\` and
/// `:`, and free of empty, `.` and `..` components, so joining it under an
/// extraction root cannot escape that root on any platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryPath(String);

impl EntryPath {
    pub const MAX_LENGTH: usize = 256;
    pub const SEPARATOR: char = '/';

    pub fn new(value: String) -> Result<Self, DomainError> {
        if value.is_empty() {
            return Err(DomainError::invalid_path(value, "path cannot be empty"));
        }

        if value.len() > Self::MAX_LENGTH {
            return Err(DomainError::FilenameTooLong {
                len: value.len(),
                path: value,
                max: Self::MAX_LENGTH,
            });
        }

        if value.starts_with(Self::SEPARATOR) {
            return Err(DomainError::invalid_path(value, "path must be relative"));
        }

        if value.contains('\0') {
            return Err(DomainError::invalid_path(value, "path contains a NUL byte"));
        }

        // Separators and drive prefixes on other platforms
        if value.contains(['\\', ':']) {
            return Err(DomainError::invalid_path(
                value,
                "path contains a '\\' or ':' character",
            ));
        }

        if value
            .split(Self::SEPARATOR)
            .any(|c| c.is_empty() || c == "." || c == "..")
        {
            return Err(DomainError::invalid_path(
                value,
                "path contains an empty, '.' or '..' component",
            ));
        }

        Ok(Self(value))
    }

    /// Parse a path as stored in an archive entry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        let value = std::str::from_utf8(bytes).map_err(|_| {
            DomainError::invalid_path(String::from_utf8_lossy(bytes), "path is not valid UTF-8")
        })?;
        Self::new(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// Location of this entry below `root` on the local file system.
    pub fn to_path_under(&self, root: &Path) -> PathBuf {
        self.components()
            .fold(root.to_path_buf(), |path, component| path.join(component))
    }
}

impl std::fmt::Display for EntryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}
