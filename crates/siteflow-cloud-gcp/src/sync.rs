//! Asset synchronizer
//!
//! Mirrors a local directory tree into the bucket. Every file is attempted;
//! failures are collected into the report instead of stopping the walk.

use crate::content_type;
use crate::error::Result;
use crate::storage::ObjectStorage;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    pub content_type: String,
}

/// A file or directory that could not be synchronized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub uploaded: Vec<UploadedObject>,
    pub errors: Vec<SyncError>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct AssetSync<'a> {
    storage: &'a dyn ObjectStorage,
    bucket: &'a str,
}

impl<'a> AssetSync<'a> {
    pub fn new(storage: &'a dyn ObjectStorage, bucket: &'a str) -> Self {
        Self { storage, bucket }
    }

    /// Upload every regular file under `root`, depth-first in file-name order
    ///
    /// Symlinks are followed; a link loop or dangling link is reported.
    pub async fn sync(&self, root: &Path) -> SyncReport {
        let mut report = SyncReport::default();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    tracing::warn!("Cannot read {}: {}", path.display(), e);
                    report.errors.push(SyncError {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(key) = object_key(root, entry.path()) else {
                continue;
            };

            match self.upload(entry.path(), &key).await {
                Ok(content_type) => {
                    tracing::debug!("Uploaded {} ({})", key, content_type);
                    report.uploaded.push(UploadedObject {
                        key,
                        content_type: content_type.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to upload {}: {}", entry.path().display(), e);
                    report.errors.push(SyncError {
                        path: entry.path().to_path_buf(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Write one object, then assign its content type
    async fn upload(&self, path: &Path, key: &str) -> Result<&'static str> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = content_type::detect(key, &bytes);

        self.storage.write_object(self.bucket, key, bytes).await?;
        self.storage
            .set_content_type(self.bucket, key, content_type)
            .await?;

        Ok(content_type)
    }
}

/// `/`-separated key of `path` relative to `root`
fn object_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStorage, StorageCall};
    use std::fs;

    fn site_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static/js")).unwrap();
        fs::write(dir.path().join("index.html"), "<!DOCTYPE html><html></html>").unwrap();
        fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();
        fs::write(dir.path().join("static/js/bundle.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("static/js/bundle.js.map"), "{}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_sync_uploads_tree_with_content_types() {
        let dir = site_tree();
        let storage = MemoryStorage::with_bucket("site", &[]);

        let report = AssetSync::new(&storage, "site").sync(dir.path()).await;

        assert!(report.is_clean());
        let uploaded: Vec<(&str, &str)> = report
            .uploaded
            .iter()
            .map(|o| (o.key.as_str(), o.content_type.as_str()))
            .collect();
        assert_eq!(
            uploaded,
            vec![
                ("app.css", "text/css"),
                ("index.html", "text/html; charset=utf-8"),
                ("static/js/bundle.js", "application/javascript"),
                ("static/js/bundle.js.map", "binary/octet-stream"),
            ]
        );

        let index = storage.object("site", "index.html").unwrap();
        assert_eq!(index.data, b"<!DOCTYPE html><html></html>");
        assert_eq!(index.content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_sync_continues_after_failed_upload() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("c.txt"), "c").unwrap();

        let storage = MemoryStorage::with_bucket("site", &[]);
        storage.fail_write("b.txt");

        let report = AssetSync::new(&storage, "site").sync(dir.path()).await;

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.ends_with("b.txt"));
        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(
            storage.count(|c| matches!(c, StorageCall::WriteObject(_))),
            3
        );
        assert!(storage.object("site", "c.txt").is_some());
    }

    #[tokio::test]
    async fn test_sync_continues_after_failed_content_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        let storage = MemoryStorage::with_bucket("site", &[]);
        storage.fail_content_type("a.txt");

        let report = AssetSync::new(&storage, "site").sync(dir.path()).await;

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.ends_with("a.txt"));
        assert!(report.errors[0].message.contains("rate limit"));
        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(report.uploaded[0].key, "b.txt");

        // The bytes landed even though the type update failed
        let a = storage.object("site", "a.txt").unwrap();
        assert_eq!(a.data, b"a");
        assert_eq!(a.content_type, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_subdirectory_does_not_stop_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "s").unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores permission bits
        let readable = fs::read_dir(&locked).is_ok();

        let storage = MemoryStorage::with_bucket("site", &[]);
        let report = AssetSync::new(&storage, "site").sync(dir.path()).await;

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let keys: Vec<&str> = report.uploaded.iter().map(|o| o.key.as_str()).collect();
        if readable {
            assert!(report.is_clean());
            assert_eq!(keys, vec!["index.html", "locked/secret.txt", "robots.txt"]);
        } else {
            assert_eq!(report.errors.len(), 1);
            assert!(report.errors[0].path.ends_with("locked"));
            assert_eq!(keys, vec!["index.html", "robots.txt"]);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_files_are_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        fs::write(shared.path().join("logo.png.txt"), "shared").unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::os::unix::fs::symlink(
            shared.path().join("logo.png.txt"),
            dir.path().join("logo.txt"),
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling"))
            .unwrap();

        let storage = MemoryStorage::with_bucket("site", &[]);
        let report = AssetSync::new(&storage, "site").sync(dir.path()).await;

        assert_eq!(storage.object("site", "logo.txt").unwrap().data, b"shared");
        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.ends_with("dangling"));
    }

    #[tokio::test]
    async fn test_missing_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MemoryStorage::with_bucket("site", &[]);

        let report = AssetSync::new(&storage, "site")
            .sync(&dir.path().join("missing"))
            .await;

        assert_eq!(report.errors.len(), 1);
        assert!(report.uploaded.is_empty());
    }

    #[test]
    fn test_object_key() {
        let root = Path::new("/srv/build");
        assert_eq!(
            object_key(root, Path::new("/srv/build/static/js/app.js")).as_deref(),
            Some("static/js/app.js")
        );
        assert_eq!(object_key(root, root), None);
    }
}
