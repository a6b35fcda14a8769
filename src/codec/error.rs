use thiserror::Error;

/// Errors raised by the compression engine.
///
/// `AlphabetOverflow` and `CompressedSizeOverflow` are recoverable: the
/// caller is expected to fall back to raw storage for that one file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("alphabet overflow: {symbols} distinct symbols exceed the {max}-entry decode map")]
    AlphabetOverflow { symbols: usize, max: usize },

    #[error("compressed size overflow: {size} bytes exceeds maximum {max}")]
    CompressedSizeOverflow { size: usize, max: usize },

    #[error("content too large: {size} bytes exceeds maximum {max}")]
    ContentTooLarge { size: usize, max: usize },

    #[error("corrupt stream: {0}")]
    CorruptStream(String),
}

impl CodecError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptStream(reason.into())
    }

    /// Whether raw storage can stand in for the failed encoding.
    pub fn is_fallback_trigger(&self) -> bool {
        matches!(
            self,
            Self::AlphabetOverflow { .. } | Self::CompressedSizeOverflow { .. }
        )
    }

    pub fn is_corrupt_stream(&self) -> bool {
        matches!(self, Self::CorruptStream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_triggers() {
        assert!(CodecError::AlphabetOverflow { symbols: 256, max: 255 }.is_fallback_trigger());
        assert!(CodecError::CompressedSizeOverflow { size: 65536, max: 65535 }
            .is_fallback_trigger());
        assert!(!CodecError::corrupt("bad").is_fallback_trigger());
        assert!(!CodecError::ContentTooLarge { size: 1, max: 0 }.is_fallback_trigger());
        assert!(CodecError::corrupt("bad").is_corrupt_stream());
    }

    #[test]
    fn test_error_display() {
        let err = CodecError::CompressedSizeOverflow { size: 70000, max: 65535 };
        assert!(err.to_string().contains("70000"));
        assert!(err.to_string().contains("65535"));
        assert!(CodecError::corrupt("truncated")
            .to_string()
            .contains("corrupt stream: truncated"));
    }
}
