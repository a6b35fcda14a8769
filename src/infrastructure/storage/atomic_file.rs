use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use uuid::Uuid;

/// Buffer size for container writes.
const BUFFER_SIZE: usize = 256 * 1024;

/// Writes a file under a temporary name and renames it into place on commit.
///
/// The temporary file lives next to the destination so the rename stays on
/// one file system and is atomic. Dropping the writer without calling
/// [`commit`](Self::commit) removes the temporary file, so readers only ever
/// see a complete file or no file.
pub struct AtomicFileWriter {
    final_path: PathBuf,
    temp_path: PathBuf,
    file: Option<BufWriter<File>>,
    durable: bool,
    bytes_written: u64,
}

impl AtomicFileWriter {
    /// Open a fresh temporary file for `final_path`.
    ///
    /// With `durable` set, data and the parent directory are fsynced on
    /// commit.
    pub async fn create(final_path: &Path, durable: bool) -> io::Result<Self> {
        let temp_path = Self::temp_path_for(final_path);
        debug!("Opening temp file {:?} for {:?}", temp_path, final_path);

        let file = File::create(&temp_path).await?;
        Ok(Self {
            final_path: final_path.to_path_buf(),
            temp_path,
            file: Some(BufWriter::with_capacity(BUFFER_SIZE, file)),
            durable,
            bytes_written: 0,
        })
    }

    /// Temp path: `<parent>/.<file name>.<uuid>.tmp`
    fn temp_path_for(final_path: &Path) -> PathBuf {
        let name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_name = format!(".{}.{}.tmp", name, Uuid::new_v4());
        match final_path.parent() {
            Some(parent) => parent.join(temp_name),
            None => PathBuf::from(temp_name),
        }
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("atomic writer already finished"))?;
        file.write_all(bytes).await?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Flush, optionally fsync, and atomically publish the file.
    ///
    /// On failure the temporary file is removed and the destination is left
    /// untouched.
    pub async fn commit(mut self) -> io::Result<u64> {
        let Some(mut file) = self.file.take() else {
            return Err(io::Error::other("atomic writer already finished"));
        };

        let published = async {
            file.flush().await?;
            if self.durable {
                file.get_mut().sync_all().await?;
            }
            drop(file);
            fs::rename(&self.temp_path, &self.final_path).await
        }
        .await;

        if let Err(e) = published {
            warn!("Failed to publish {:?}: {}", self.final_path, e);
            let _ = fs::remove_file(&self.temp_path).await;
            // Nothing left for Drop to clean up.
            self.temp_path = PathBuf::new();
            return Err(e);
        }
        let temp_path = std::mem::take(&mut self.temp_path);
        debug!("Renamed {:?} to {:?}", temp_path, self.final_path);

        // Persist the rename itself; the data is already safe, so only warn.
        if self.durable {
            if let Some(parent) = self.final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                match File::open(parent).await {
                    Ok(dir) => {
                        if let Err(e) = dir.sync_all().await {
                            warn!("Failed to sync parent directory after rename: {}", e);
                        }
                    }
                    Err(e) => warn!("Failed to open parent directory for sync: {}", e),
                }
            }
        }

        Ok(self.bytes_written)
    }
}

impl Drop for AtomicFileWriter {
    fn drop(&mut self) {
        drop(self.file.take());
        if self.temp_path.as_os_str().is_empty() {
            return;
        }
        debug!("Discarding temp file {:?}", self.temp_path);
        if let Err(e) = std::fs::remove_file(&self.temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove temp file {:?}: {}", self.temp_path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_commit_publishes_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.sipped");

        let mut writer = AtomicFileWriter::create(&target, true).await.unwrap();
        assert!(writer.temp_path().starts_with(dir.path()));
        writer.write_all(b"hello ").await.unwrap();
        writer.write_all(b"world").await.unwrap();
        assert!(!target.exists());

        assert_eq!(writer.commit().await.unwrap(), 11);
        assert_eq!(std::fs::read(&target).unwrap(), b"hello world");
        assert_eq!(dir_entries(dir.path()), vec!["out.sipped"]);
    }

    #[tokio::test]
    async fn test_drop_discards_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.sipped");

        let mut writer = AtomicFileWriter::create(&target, false).await.unwrap();
        writer.write_all(b"partial").await.unwrap();
        drop(writer);

        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_commit_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.sipped");
        std::fs::write(&target, b"old contents").unwrap();

        let mut writer = AtomicFileWriter::create(&target, false).await.unwrap();
        writer.write_all(b"new").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"old contents");

        writer.commit().await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = AtomicFileWriter::temp_path_for(Path::new("/data/archive.sipped"));
        assert_eq!(temp.parent(), Some(Path::new("/data")));
        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".archive.sipped."));
        assert!(name.ends_with(".tmp"));
    }
}
