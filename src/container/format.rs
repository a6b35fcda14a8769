//! Container entry layout.
//!
//! ```text
//! sip container (.sipped), entries repeated until end of file
//! ============================================================
//!
//! Per entry (little-endian):
//! - Filename length: 1 byte (1-256, 256 written as 0)
//! - Filename: UTF-8 relative path, '/'-separated
//! - Original length: 4 bytes (symbols to decode)
//! - Payload length: 2 bytes (<= 65535)
//! - Decode map length: 1 byte (pairs, <= 255)
//! - Decode map: (symbol, code length) pairs, ascending symbol
//! - Payload: MSB-first packed codes, zero padded
//! ```
//!
//! There is no magic number, index or footer.

use std::path::{Path, PathBuf};

use crate::codec::{self, CodecError, DecodeMap, Encoded, EncodingKind, MAX_PAYLOAD_LEN};
use crate::domain::value_objects::EntryPath;

/// File extension of archives
pub const ARCHIVE_EXTENSION: &str = "sipped";

pub const NAME_LEN_SIZE: usize = 1;
pub const ORIGINAL_LEN_SIZE: usize = 4;
pub const PAYLOAD_LEN_SIZE: usize = 2;
pub const MAP_LEN_SIZE: usize = 1;

/// Fixed bytes per entry besides filename, map and payload
pub const ENTRY_OVERHEAD: usize = NAME_LEN_SIZE + ORIGINAL_LEN_SIZE + PAYLOAD_LEN_SIZE + MAP_LEN_SIZE;

/// Filename length as stored in its one-byte field.
#[inline]
pub fn encode_name_len(len: usize) -> u8 {
    debug_assert!((1..=EntryPath::MAX_LENGTH).contains(&len));
    (len % 256) as u8
}

/// Inverse of [`encode_name_len`]; empty names do not exist, so 0 means 256.
#[inline]
pub fn decode_name_len(byte: u8) -> usize {
    if byte == 0 {
        EntryPath::MAX_LENGTH
    } else {
        byte as usize
    }
}

/// `name` with the archive extension appended unless it already ends in it.
pub fn archive_file_name(name: &Path) -> PathBuf {
    if name.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION) {
        return name.to_path_buf();
    }
    let mut file_name = name.as_os_str().to_os_string();
    file_name.push(".");
    file_name.push(ARCHIVE_EXTENSION);
    PathBuf::from(file_name)
}

/// One file's record in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    path: EntryPath,
    original_len: u32,
    decode_map: DecodeMap,
    payload: Vec<u8>,
}

impl ArchiveEntry {
    /// Pair an encoded file with its archive path.
    pub fn new(path: EntryPath, encoded: Encoded) -> Result<Self, CodecError> {
        if encoded.payload.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::CompressedSizeOverflow {
                size: encoded.payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        Ok(Self {
            path,
            original_len: encoded.original_len,
            decode_map: encoded.decode_map,
            payload: encoded.payload,
        })
    }

    pub fn path(&self) -> &EntryPath {
        &self.path
    }

    pub fn original_len(&self) -> u32 {
        self.original_len
    }

    pub fn decode_map(&self) -> &DecodeMap {
        &self.decode_map
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn kind(&self) -> EncodingKind {
        if self.decode_map.is_stored() {
            EncodingKind::Stored
        } else {
            EncodingKind::Huffman
        }
    }

    /// Bytes this entry occupies in the container.
    pub fn encoded_len(&self) -> usize {
        ENTRY_OVERHEAD + self.path.as_bytes().len() + self.decode_map.byte_len() + self.payload.len()
    }

    /// Serialize the entry onto the end of `buffer`.
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(self.encoded_len());

        let name = self.path.as_bytes();
        buffer.push(encode_name_len(name.len()));
        buffer.extend_from_slice(name);
        buffer.extend_from_slice(&self.original_len.to_le_bytes());
        buffer.extend_from_slice(&(self.payload.len() as u16).to_le_bytes());
        buffer.push(self.decode_map.len() as u8);
        self.decode_map.write_to_buffer(buffer);
        buffer.extend_from_slice(&self.payload);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        self.write_to_buffer(&mut buffer);
        buffer
    }

    /// Reconstruct the file contents.
    pub fn decode(&self) -> Result<Vec<u8>, CodecError> {
        codec::decode(&self.decode_map, &self.payload, self.original_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_name_len_wraps_at_256() {
        assert_eq!(encode_name_len(1), 1);
        assert_eq!(encode_name_len(255), 255);
        assert_eq!(encode_name_len(256), 0);
        assert_eq!(decode_name_len(0), 256);
        assert_eq!(decode_name_len(17), 17);
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name(Path::new("backup")), Path::new("backup.sipped"));
        assert_eq!(archive_file_name(Path::new("out/b.sipped")), Path::new("out/b.sipped"));
        assert_eq!(archive_file_name(Path::new("notes.txt")), Path::new("notes.txt.sipped"));
    }

    #[test]
    fn test_entry_layout() {
        let path = EntryPath::from_str("d/f").unwrap();
        let entry = ArchiveEntry::new(path, codec::encode(b"abac").unwrap()).unwrap();

        let bytes = entry.to_bytes();
        assert_eq!(
            bytes,
            vec![
                3, b'd', b'/', b'f', // filename
                4, 0, 0, 0, // original length
                1, 0, // payload length
                3, // map pairs
                b'a', 1, b'b', 2, b'c', 2, // map
                0b0100_1100, // payload
            ]
        );
        assert_eq!(bytes.len(), entry.encoded_len());
        assert_eq!(entry.decode().unwrap(), b"abac");
    }

    #[test]
    fn test_stored_entry_layout() {
        let path = EntryPath::from_str("raw").unwrap();
        let entry = ArchiveEntry::new(path, codec::store(b"xy").unwrap()).unwrap();
        assert_eq!(entry.kind(), EncodingKind::Stored);
        assert_eq!(
            entry.to_bytes(),
            vec![3, b'r', b'a', b'w', 2, 0, 0, 0, 2, 0, 1, 0, 0, b'x', b'y']
        );
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let encoded = Encoded {
            decode_map: DecodeMap::stored(),
            payload: vec![0; MAX_PAYLOAD_LEN + 1],
            original_len: (MAX_PAYLOAD_LEN + 1) as u32,
        };
        let path = EntryPath::from_str("big").unwrap();
        assert!(ArchiveEntry::new(path, encoded).is_err());
    }
}
