use std::path::Path;
use tracing::debug;

use super::extract_archive::read_archive;
use crate::application::dto::EntryInfo;
use crate::application::errors::ArchiveError;
use crate::container::ContainerReader;

/// Use case: describe the entries of a container without decoding them
pub struct ListArchiveUseCase;

impl ListArchiveUseCase {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, archive_path: &Path) -> Result<Vec<EntryInfo>, ArchiveError> {
        let data = read_archive(archive_path).await?;

        let entries = ContainerReader::from_slice(&data)
            .map(|entry| entry.map(|e| EntryInfo::from(&e)))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Listed {} entries in {:?}", entries.len(), archive_path);
        Ok(entries)
    }
}

impl Default for ListArchiveUseCase {
    fn default() -> Self {
        Self::new()
    }
}
