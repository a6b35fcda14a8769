use std::collections::HashSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::application::errors::ArchiveError;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::EntryPath;

/// A regular file found under one of the input roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Where to read the file from
    pub source: PathBuf,
    /// Name of the file inside the archive
    pub entry_path: EntryPath,
    /// Size reported by the traversal, checked before the file is read
    pub len: u64,
}

/// Depth-first discovery of the files under a set of input paths.
///
/// Uses an explicit stack instead of recursion. Children are sorted by name
/// and pushed in reverse, so files come out in ascending name order within
/// each directory and roots are visited in the order given. Every file's
/// entry path is validated here, before anything is read or compressed.
pub struct TreeWalker;

impl TreeWalker {
    pub async fn walk(roots: &[PathBuf]) -> Result<Vec<WalkedFile>, ArchiveError> {
        let mut stack = Vec::with_capacity(roots.len());
        for root in roots.iter().rev() {
            stack.push((root.clone(), Self::root_name(root).await?, true));
        }

        let mut files = Vec::new();
        let mut seen = HashSet::new();

        while let Some((path, name, is_root)) = stack.pop() {
            // Below a root, entries that vanish or dangle are skipped
            let link = match fs::symlink_metadata(&path).await {
                Ok(link) => link,
                Err(e) if !is_root && e.kind() == ErrorKind::NotFound => {
                    warn!("Skipping {:?}: removed during traversal", path);
                    continue;
                }
                Err(e) => return Err(Self::not_found_or_io(&path, e)),
            };
            let metadata = match fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if !is_root && e.kind() == ErrorKind::NotFound => {
                    warn!("Skipping dangling symlink {:?}", path);
                    continue;
                }
                Err(e) => return Err(Self::not_found_or_io(&path, e)),
            };

            if metadata.is_dir() {
                if link.file_type().is_symlink() && !is_root {
                    warn!("Skipping symlinked directory {:?}", path);
                    continue;
                }

                let mut children: Vec<OsString> = Vec::new();
                let mut listing = fs::read_dir(&path).await.map_err(ArchiveError::io(&path))?;
                while let Some(child) = listing.next_entry().await.map_err(ArchiveError::io(&path))? {
                    children.push(child.file_name());
                }
                children.sort();
                debug!("Listed {} children of {:?}", children.len(), path);

                for child in children.into_iter().rev() {
                    let child_name = Self::utf8_name(&path.join(&child), child.clone())?;
                    stack.push((path.join(&child), format!("{name}/{child_name}"), false));
                }
            } else if metadata.is_file() {
                let entry_path = EntryPath::new(name)?;
                if !seen.insert(entry_path.clone()) {
                    warn!(
                        "Duplicate entry path {} from {:?}; the later entry wins on extraction",
                        entry_path, path
                    );
                }
                files.push(WalkedFile {
                    source: path,
                    entry_path,
                    len: metadata.len(),
                });
            } else {
                warn!("Skipping special file {:?}", path);
            }
        }

        Ok(files)
    }

    /// Archive name of an input root: its final path component.
    async fn root_name(root: &Path) -> Result<String, ArchiveError> {
        let name = match root.file_name() {
            Some(name) => name.to_os_string(),
            // "." / ".." / "/" have no final component of their own
            None => {
                let resolved = fs::canonicalize(root)
                    .await
                    .map_err(|e| Self::not_found_or_io(root, e))?;
                resolved
                    .file_name()
                    .map(|n| n.to_os_string())
                    .ok_or_else(|| {
                        DomainError::invalid_path(
                            root.display().to_string(),
                            "input has no name to archive it under",
                        )
                    })?
            }
        };
        Self::utf8_name(root, name)
    }

    fn utf8_name(path: &Path, name: OsString) -> Result<String, ArchiveError> {
        name.into_string().map_err(|_| {
            DomainError::invalid_path(path.display().to_string(), "path is not valid UTF-8").into()
        })
    }

    fn not_found_or_io(path: &Path, e: std::io::Error) -> ArchiveError {
        if e.kind() == ErrorKind::NotFound {
            ArchiveError::PathNotFound(path.to_path_buf())
        } else {
            ArchiveError::io(path)(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn names(files: &[WalkedFile]) -> Vec<&str> {
        files.iter().map(|f| f.entry_path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_walk_is_sorted_depth_first() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("proj");
        stdfs::create_dir_all(root.join("src/nested")).unwrap();
        stdfs::create_dir_all(root.join("docs")).unwrap();
        stdfs::write(root.join("zeta.txt"), b"z").unwrap();
        stdfs::write(root.join("alpha.txt"), b"a").unwrap();
        stdfs::write(root.join("src/main.rs"), b"fn main() {}").unwrap();
        stdfs::write(root.join("src/nested/deep.rs"), b"").unwrap();
        stdfs::write(root.join("docs/readme.md"), b"# hi").unwrap();

        let files = TreeWalker::walk(&[root]).await.unwrap();
        assert_eq!(
            names(&files),
            vec![
                "proj/alpha.txt",
                "proj/docs/readme.md",
                "proj/src/main.rs",
                "proj/src/nested/deep.rs",
                "proj/zeta.txt",
            ]
        );
        assert_eq!(files[2].len, 12);
    }

    #[tokio::test]
    async fn test_roots_keep_argument_order() {
        let dir = TempDir::new().unwrap();
        stdfs::write(dir.path().join("b.txt"), b"b").unwrap();
        stdfs::write(dir.path().join("a.txt"), b"a").unwrap();

        let files = TreeWalker::walk(&[dir.path().join("b.txt"), dir.path().join("a.txt")])
            .await
            .unwrap();
        assert_eq!(names(&files), vec!["b.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_path_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = TreeWalker::walk(&[missing.clone()]).await.unwrap_err();
        assert!(matches!(err, ArchiveError::PathNotFound(p) if p == missing));
    }

    #[tokio::test]
    async fn test_empty_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        stdfs::create_dir(dir.path().join("empty")).unwrap();
        let files = TreeWalker::walk(&[dir.path().join("empty")]).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_long_entry_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("r");
        // "r/" + 250 bytes + "/" + 4 bytes = 257 bytes
        let sub = root.join("d".repeat(250));
        stdfs::create_dir_all(&sub).unwrap();
        stdfs::write(sub.join("ffff"), b"x").unwrap();

        let err = TreeWalker::walk(&[root]).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Domain(DomainError::FilenameTooLong { len: 257, .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_not_descended() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        stdfs::create_dir_all(&root).unwrap();
        stdfs::write(root.join("file"), b"x").unwrap();
        std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

        let files = TreeWalker::walk(&[root]).await.unwrap();
        assert_eq!(names(&files), vec!["root/file"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_below_root_is_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        stdfs::create_dir_all(&root).unwrap();
        stdfs::write(root.join("file"), b"x").unwrap();
        std::os::unix::fs::symlink("../gone", root.join("broken")).unwrap();

        let files = TreeWalker::walk(&[root]).await.unwrap();
        assert_eq!(names(&files), vec!["root/file"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_root_is_path_not_found() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("broken");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

        let err = TreeWalker::walk(&[link.clone()]).await.unwrap_err();
        assert!(matches!(err, ArchiveError::PathNotFound(p) if p == link));
    }
}
