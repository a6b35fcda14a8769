use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::application::dto::ArchiveSummary;
use crate::application::errors::ArchiveError;
use crate::codec::{self, EncodingKind};
use crate::config::Config;
use crate::container::ArchiveEntry;
use crate::infrastructure::storage::{AtomicFileWriter, TreeWalker, WalkedFile};

/// Use case: pack a set of files and directories into one container
pub struct CreateArchiveUseCase {
    workers: usize,
    durable_writes: bool,
}

impl CreateArchiveUseCase {
    pub fn new(workers: usize, durable_writes: bool) -> Self {
        Self {
            workers: workers.max(1),
            durable_writes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.workers, config.durable_writes)
    }

    /// Execute archive creation workflow
    ///
    /// The container only appears at `archive_path` once every entry has been
    /// written; any error leaves the destination as it was.
    pub async fn execute(
        &self,
        inputs: &[PathBuf],
        archive_path: &Path,
    ) -> Result<ArchiveSummary, ArchiveError> {
        if inputs.is_empty() {
            return Err(ArchiveError::InvalidRequest(
                "at least one input path is required".to_string(),
            ));
        }

        // 1. Every input must exist before any output is created
        for input in inputs {
            match fs::try_exists(input).await {
                Ok(true) => {}
                Ok(false) => return Err(ArchiveError::PathNotFound(input.clone())),
                Err(e) => return Err(ArchiveError::io(input)(e)),
            }
        }

        // 2. Discover files; entry paths are validated here
        let files = TreeWalker::walk(inputs).await?;
        info!(
            "Archiving {} files from {} inputs into {:?}",
            files.len(),
            inputs.len(),
            archive_path
        );

        // 3. Compress on the worker pool, append in traversal order
        let mut sink = AtomicFileWriter::create(archive_path, self.durable_writes)
            .await
            .map_err(ArchiveError::io(archive_path))?;

        let mut entries = stream::iter(files)
            .map(Self::compress_file)
            .buffered(self.workers);

        let mut summary = ArchiveSummary {
            archive_path: archive_path.to_path_buf(),
            entries: 0,
            stored_entries: 0,
            input_bytes: 0,
            archive_bytes: 0,
        };
        let mut buffer = Vec::new();

        while let Some(entry) = entries.next().await {
            let entry = entry?;

            buffer.clear();
            entry.write_to_buffer(&mut buffer);
            if let Err(e) = sink.write_all(&buffer).await {
                return Err(ArchiveError::io(sink.temp_path())(e));
            }

            summary.entries += 1;
            summary.input_bytes += entry.original_len() as u64;
            if entry.kind() == EncodingKind::Stored {
                summary.stored_entries += 1;
            }
        }

        // 4. Publish
        summary.archive_bytes = sink
            .commit()
            .await
            .map_err(ArchiveError::io(archive_path))?;

        info!(
            "Created {:?}: {} entries ({} stored), {} -> {} bytes",
            archive_path,
            summary.entries,
            summary.stored_entries,
            summary.input_bytes,
            summary.archive_bytes
        );
        Ok(summary)
    }

    async fn compress_file(file: WalkedFile) -> Result<ArchiveEntry, ArchiveError> {
        // Oversized files fail from their metadata alone, before any read.
        codec::check_encodable_len(file.len)
            .map_err(ArchiveError::codec(file.entry_path.as_str()))?;

        let content = fs::read(&file.source)
            .await
            .map_err(ArchiveError::io(&file.source))?;

        let entry_path = file.entry_path;
        let name = entry_path.to_string();
        let encoded = tokio::task::spawn_blocking(move || codec::compress(&content))
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))?
            .map_err(ArchiveError::codec(name.as_str()))?;

        debug!(
            "Encoded {} ({:?}): {} -> {} payload bytes, {} map entries",
            name,
            encoded.kind(),
            encoded.original_len,
            encoded.payload.len(),
            encoded.decode_map.len()
        );

        ArchiveEntry::new(entry_path, encoded).map_err(ArchiveError::codec(name))
    }
}
