use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors raised while parsing a container.
///
/// The format has no index, so a framing error makes every later entry
/// unreachable: parsing cannot resume after one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("corrupt stream at byte {offset}: {field} needs {needed} bytes, {available} left")]
    CorruptStream {
        offset: usize,
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("corrupt stream at byte {offset}: {source}")]
    InvalidEntryPath {
        offset: usize,
        #[source]
        source: DomainError,
    },
}
