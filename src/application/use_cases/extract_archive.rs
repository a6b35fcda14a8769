use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::application::dto::ExtractSummary;
use crate::application::errors::ArchiveError;
use crate::container::ContainerReader;

/// What to do with an entry whose payload does not decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorruptPolicy {
    /// Stop at the first undecodable entry
    #[default]
    Abort,
    /// Log the entry and carry on with the next one
    Skip,
}

/// Use case: restore the file tree stored in a container
pub struct ExtractArchiveUseCase {
    policy: CorruptPolicy,
}

impl ExtractArchiveUseCase {
    pub fn new(policy: CorruptPolicy) -> Self {
        Self { policy }
    }

    /// Execute extraction workflow
    ///
    /// Entries are written as they are parsed. Framing errors end extraction
    /// regardless of policy; files written before the error stay on disk.
    pub async fn execute(
        &self,
        archive_path: &Path,
        destination: &Path,
    ) -> Result<ExtractSummary, ArchiveError> {
        // 1. Load container
        let data = read_archive(archive_path).await?;
        info!("Extracting {:?} ({} bytes) into {:?}", archive_path, data.len(), destination);

        fs::create_dir_all(destination)
            .await
            .map_err(ArchiveError::io(destination))?;

        // 2. Decode and write entries in archive order
        let mut summary = ExtractSummary::default();
        for entry in ContainerReader::from_slice(&data) {
            let entry = entry?;

            let content = match entry.decode() {
                Ok(content) => content,
                Err(e) if self.policy == CorruptPolicy::Skip && e.is_corrupt_stream() => {
                    warn!("Skipping corrupt entry {} at offset {}: {}", entry.path, entry.offset, e);
                    summary.skipped.push(entry.path);
                    continue;
                }
                Err(e) => return Err(ArchiveError::codec(entry.path.as_str())(e)),
            };

            let target = entry.path.to_path_under(destination);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(ArchiveError::io(parent))?;
            }
            fs::write(&target, &content)
                .await
                .map_err(ArchiveError::io(&target))?;

            debug!("Wrote {:?} ({} bytes, {:?})", target, content.len(), entry.kind());
            summary.files_written += 1;
            summary.bytes_written += content.len() as u64;
        }

        info!(
            "Extracted {} files ({} bytes), skipped {}",
            summary.files_written,
            summary.bytes_written,
            summary.skipped.len()
        );
        Ok(summary)
    }
}

/// Read a whole container, reporting a missing file as `PathNotFound`.
pub(crate) async fn read_archive(archive_path: &Path) -> Result<Vec<u8>, ArchiveError> {
    fs::read(archive_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArchiveError::PathNotFound(archive_path.to_path_buf())
        } else {
            ArchiveError::io(archive_path)(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::container::ArchiveEntry;
    use crate::domain::value_objects::EntryPath;
    use tempfile::TempDir;

    fn entry(path: &str, content: &[u8]) -> ArchiveEntry {
        ArchiveEntry::new(
            EntryPath::new(path.to_string()).unwrap(),
            codec::compress(content).unwrap(),
        )
        .unwrap()
    }

    fn write_archive(dir: &Path, entries: &[ArchiveEntry]) -> std::path::PathBuf {
        let mut bytes = Vec::new();
        for entry in entries {
            entry.write_to_buffer(&mut bytes);
        }
        let path = dir.join("test.sipped");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// An entry whose map claims one 1-bit code but whose payload starts with 1.
    fn corrupt_entry(path: &str) -> Vec<u8> {
        let mut bytes = vec![path.len() as u8];
        bytes.extend_from_slice(path.as_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&[b'z', 1]);
        bytes.push(0b1110_0000);
        bytes
    }

    #[tokio::test]
    async fn test_extract_recreates_tree() {
        let temp = TempDir::new().unwrap();
        let archive = write_archive(
            temp.path(),
            &[entry("docs/readme.md", b"# hello\n"), entry("docs/deep/empty", b"")],
        );
        let dest = temp.path().join("out");

        let summary = ExtractArchiveUseCase::new(CorruptPolicy::Abort)
            .execute(&archive, &dest)
            .await
            .unwrap();

        assert_eq!(summary.files_written, 2);
        assert_eq!(summary.bytes_written, 8);
        assert!(summary.skipped.is_empty());
        assert_eq!(std::fs::read(dest.join("docs/readme.md")).unwrap(), b"# hello\n");
        assert_eq!(std::fs::read(dest.join("docs/deep/empty")).unwrap(), b"");
    }

    #[tokio::test]
    async fn test_corrupt_payload_aborts_by_default() {
        let temp = TempDir::new().unwrap();
        let mut bytes = entry("a", b"first").to_bytes();
        bytes.extend(corrupt_entry("b"));
        bytes.extend(entry("c", b"third").to_bytes());
        let archive = temp.path().join("x.sipped");
        std::fs::write(&archive, bytes).unwrap();
        let dest = temp.path().join("out");

        let err = ExtractArchiveUseCase::new(CorruptPolicy::default())
            .execute(&archive, &dest)
            .await
            .unwrap_err();

        assert!(err.is_corrupt_stream());
        assert!(err.to_string().contains("in b:"));
        assert!(dest.join("a").exists());
        assert!(!dest.join("c").exists());
    }

    #[tokio::test]
    async fn test_skip_policy_continues_past_corrupt_entry() {
        let temp = TempDir::new().unwrap();
        let mut bytes = entry("a", b"first").to_bytes();
        bytes.extend(corrupt_entry("b"));
        bytes.extend(entry("c", b"third").to_bytes());
        let archive = temp.path().join("x.sipped");
        std::fs::write(&archive, bytes).unwrap();
        let dest = temp.path().join("out");

        let summary = ExtractArchiveUseCase::new(CorruptPolicy::Skip)
            .execute(&archive, &dest)
            .await
            .unwrap();

        assert_eq!(summary.files_written, 2);
        assert_eq!(summary.skipped, vec![EntryPath::new("b".to_string()).unwrap()]);
        assert!(!dest.join("b").exists());
        assert_eq!(std::fs::read(dest.join("c")).unwrap(), b"third");
    }

    #[tokio::test]
    async fn test_truncation_aborts_even_when_skipping() {
        let temp = TempDir::new().unwrap();
        let mut bytes = entry("a", b"first").to_bytes();
        bytes.extend_from_slice(&entry("b", b"second").to_bytes()[..4]);
        let archive = temp.path().join("x.sipped");
        std::fs::write(&archive, bytes).unwrap();

        let err = ExtractArchiveUseCase::new(CorruptPolicy::Skip)
            .execute(&archive, &temp.path().join("out"))
            .await
            .unwrap_err();

        assert!(matches!(err, ArchiveError::Container(_)));
        assert!(err.is_corrupt_stream());
    }

    #[tokio::test]
    async fn test_missing_archive() {
        let temp = TempDir::new().unwrap();
        let err = ExtractArchiveUseCase::new(CorruptPolicy::Abort)
            .execute(&temp.path().join("nope.sipped"), temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_archive_extracts_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = write_archive(temp.path(), &[]);
        let summary = ExtractArchiveUseCase::new(CorruptPolicy::Abort)
            .execute(&archive, &temp.path().join("out"))
            .await
            .unwrap();
        assert_eq!(summary, ExtractSummary::default());
    }
}
