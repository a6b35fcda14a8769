//! Sequential container parsing.

use super::error::ContainerError;
use super::format::{
    decode_name_len, MAP_LEN_SIZE, NAME_LEN_SIZE, ORIGINAL_LEN_SIZE, PAYLOAD_LEN_SIZE,
};
use crate::codec::{self, CodecError, DecodeMap, EncodingKind};
use crate::domain::value_objects::EntryPath;

/// An entry parsed in place; the payload borrows from the container bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry<'a> {
    /// Byte offset of the entry's first header field
    pub offset: usize,
    pub path: EntryPath,
    pub original_len: u32,
    pub decode_map: DecodeMap,
    pub payload: &'a [u8],
}

impl RawEntry<'_> {
    pub fn kind(&self) -> EncodingKind {
        if self.decode_map.is_stored() {
            EncodingKind::Stored
        } else {
            EncodingKind::Huffman
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, CodecError> {
        codec::decode(&self.decode_map, self.payload, self.original_len)
    }
}

/// Iterates the entries of a container held in memory.
///
/// Yields `Err` at most once: after a framing error the iterator is fused,
/// since nothing after it can be located.
pub struct ContainerReader<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> ContainerReader<'a> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ContainerError> {
        let available = self.remaining();
        if len > available {
            return Err(ContainerError::CorruptStream {
                offset: self.offset,
                field,
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ContainerError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N, field)?);
        Ok(array)
    }

    fn read_entry(&mut self) -> Result<RawEntry<'a>, ContainerError> {
        let offset = self.offset;

        let [name_len] = self.take_array::<NAME_LEN_SIZE>("filename length")?;
        let name = self.take(decode_name_len(name_len), "filename")?;
        let path = EntryPath::from_bytes(name)
            .map_err(|source| ContainerError::InvalidEntryPath { offset, source })?;

        let original_len = u32::from_le_bytes(self.take_array::<ORIGINAL_LEN_SIZE>("original length")?);
        let payload_len = u16::from_le_bytes(self.take_array::<PAYLOAD_LEN_SIZE>("payload length")?);
        let [map_len] = self.take_array::<MAP_LEN_SIZE>("decode map length")?;

        let map_offset = self.offset;
        let map_bytes = self.take(map_len as usize * 2, "decode map")?;
        let decode_map = DecodeMap::from_bytes(map_bytes).map_err(|_| ContainerError::CorruptStream {
            offset: map_offset,
            field: "decode map",
            needed: map_len as usize * 2,
            available: map_bytes.len(),
        })?;

        let payload = self.take(payload_len as usize, "payload")?;

        Ok(RawEntry {
            offset,
            path,
            original_len,
            decode_map,
            payload,
        })
    }
}

impl<'a> Iterator for ContainerReader<'a> {
    type Item = Result<RawEntry<'a>, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining() == 0 {
            return None;
        }

        let entry = self.read_entry();
        if entry.is_err() {
            self.failed = true;
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::format::ArchiveEntry;
    use std::str::FromStr;

    fn container(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        for (name, content) in files {
            let path = EntryPath::from_str(name).unwrap();
            ArchiveEntry::new(path, codec::compress(content).unwrap())
                .unwrap()
                .write_to_buffer(&mut buffer);
        }
        buffer
    }

    #[test]
    fn test_empty_container_has_no_entries() {
        assert_eq!(ContainerReader::from_slice(&[]).count(), 0);
    }

    #[test]
    fn test_reads_entries_in_order() {
        let all_bytes: Vec<u8> = (0..=255u8).collect();
        let data = container(&[
            ("a/one.txt", &b"first file"[..]),
            ("a/b/two.txt", &b""[..]),
            ("three.bin", &all_bytes[..]),
        ]);

        let entries: Vec<RawEntry> = ContainerReader::from_slice(&data)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[0].path.as_str(), "a/one.txt");
        assert_eq!(entries[0].decode().unwrap(), b"first file");
        assert_eq!(entries[1].decode().unwrap(), b"");
        assert_eq!(entries[2].kind(), EncodingKind::Stored);
        assert_eq!(entries[2].decode().unwrap(), all_bytes);
    }

    #[test]
    fn test_256_byte_name() {
        let name = "n".repeat(256);
        let data = container(&[(name.as_str(), &b"payload"[..])]);
        assert_eq!(data[0], 0);

        let entry = ContainerReader::from_slice(&data).next().unwrap().unwrap();
        assert_eq!(entry.path.as_str(), name);
    }

    #[test]
    fn test_every_truncation_is_corrupt() {
        let data = container(&[("dir/file.txt", &b"hello hello hello"[..])]);
        for len in 1..data.len() {
            let mut reader = ContainerReader::from_slice(&data[..len]);
            assert!(
                matches!(reader.next(), Some(Err(ContainerError::CorruptStream { .. }))),
                "truncation at {len} was not detected"
            );
            assert!(reader.next().is_none());
        }
    }

    #[test]
    fn test_truncation_names_field() {
        let data = container(&[("f", &b"abc"[..])]);
        // name len + name + 2 of the 4 original length bytes
        let err = ContainerReader::from_slice(&data[..4]).next().unwrap().unwrap_err();
        assert_eq!(
            err,
            ContainerError::CorruptStream {
                offset: 2,
                field: "original length",
                needed: 4,
                available: 2,
            }
        );
    }

    #[test]
    fn test_traversal_path_is_rejected() {
        let mut data = vec![4];
        data.extend_from_slice(b"../x");
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            ContainerReader::from_slice(&data).next(),
            Some(Err(ContainerError::InvalidEntryPath { offset: 0, .. }))
        ));
    }
}
