use serde::Serialize;
use std::path::PathBuf;

use crate::codec::EncodingKind;
use crate::container::RawEntry;
use crate::domain::value_objects::EntryPath;

/// Outcome of creating an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub archive_path: PathBuf,
    pub entries: usize,
    /// Entries kept uncompressed by the raw-storage fallback
    pub stored_entries: usize,
    pub input_bytes: u64,
    pub archive_bytes: u64,
}

/// Outcome of extracting an archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    pub files_written: usize,
    pub bytes_written: u64,
    /// Entries whose payload failed to decode under `CorruptPolicy::Skip`
    pub skipped: Vec<EntryPath>,
}

/// Metadata of one archive entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub path: EntryPath,
    pub offset: usize,
    pub original_len: u32,
    pub payload_len: usize,
    pub map_entries: usize,
    pub encoding: EncodingKind,
}

impl From<&RawEntry<'_>> for EntryInfo {
    fn from(entry: &RawEntry<'_>) -> Self {
        Self {
            path: entry.path.clone(),
            offset: entry.offset,
            original_len: entry.original_len,
            payload_len: entry.payload.len(),
            map_entries: entry.decode_map.len(),
            encoding: entry.kind(),
        }
    }
}
