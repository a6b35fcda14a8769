//! Serialized form of a canonical Huffman code.
//!
//! On disk the map is a one-byte pair count followed by that many
//! `(symbol, code length)` byte pairs in ascending symbol order. The single
//! pair `(0x00, 0)` is reserved: code length zero never occurs in a real
//! code, so it marks an entry whose payload is stored uncompressed.

use super::error::CodecError;

/// Largest number of pairs the one-byte count field can describe.
pub const MAX_DECODE_MAP_ENTRIES: usize = u8::MAX as usize;

/// Code length reserved for the stored sentinel.
pub const STORED_CODE_LENGTH: u8 = 0;

/// Ordered `(symbol, code length)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecodeMap {
    entries: Vec<(u8, u8)>,
}

impl DecodeMap {
    /// Wrap pairs that are already in ascending symbol order.
    ///
    /// Fails with `AlphabetOverflow` when the count field cannot hold them.
    pub fn new(entries: Vec<(u8, u8)>) -> Result<Self, CodecError> {
        if entries.len() > MAX_DECODE_MAP_ENTRIES {
            return Err(CodecError::AlphabetOverflow {
                symbols: entries.len(),
                max: MAX_DECODE_MAP_ENTRIES,
            });
        }
        Ok(Self { entries })
    }

    /// The sentinel map flagging a literally stored payload.
    pub fn stored() -> Self {
        Self {
            entries: vec![(0, STORED_CODE_LENGTH)],
        }
    }

    pub fn is_stored(&self) -> bool {
        self.entries == [(0, STORED_CODE_LENGTH)]
    }

    pub fn entries(&self) -> &[(u8, u8)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the pair table on disk, excluding the count byte.
    pub fn byte_len(&self) -> usize {
        self.entries.len() * 2
    }

    /// Append the pair table (without the count byte) to `buffer`.
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(self.byte_len());
        for &(symbol, length) in &self.entries {
            buffer.push(symbol);
            buffer.push(length);
        }
    }

    /// Parse a pair table. `bytes` must hold exactly whole pairs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() % 2 != 0 {
            return Err(CodecError::corrupt(format!(
                "decode map of {} bytes is not a whole number of pairs",
                bytes.len()
            )));
        }
        let entries = bytes
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Self::new(entries)
    }
}
