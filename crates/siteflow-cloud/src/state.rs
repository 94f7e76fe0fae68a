//! Record storage for the host
//!
//! Keeps the latest Deployment and Release records under `.siteflow/` so
//! that separate CLI invocations can hand them to each other. The
//! orchestrator never consults these files; the provider stays the source
//! of truth for what exists.

use crate::error::{CloudError, Result};
use crate::record::{Deployment, Release};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".siteflow";
const DEPLOYMENT_FILE: &str = "deployment.json";
const RELEASE_FILE: &str = "release.json";
const LOCK_FILE: &str = "lock.json";

/// Locks older than this are considered abandoned
const STALE_LOCK_HOURS: i64 = 1;

/// On-disk envelope around a record
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord<T> {
    version: u32,
    saved_at: DateTime<Utc>,
    record: T,
}

/// Loads and saves stage records for a project directory
pub struct RecordStore {
    project_root: PathBuf,
}

impl RecordStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Get the state directory path
    pub fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn record_path(&self, file: &str) -> PathBuf {
        self.state_dir().join(file)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    /// Ensure the state directory exists
    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.record_path(file);
        if !path.exists() {
            tracing::debug!("{} not found", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let stored: StoredRecord<T> = serde_json::from_str(&content)?;

        if stored.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "{} version {} is newer than supported version {}",
                file, stored.version, STATE_VERSION
            )));
        }

        Ok(Some(stored.record))
    }

    async fn save<T: Serialize>(&self, file: &str, record: &T) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.record_path(file);
        let backup = self.record_path(&format!("{}.backup", file));

        // Keep the previous record around
        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let stored = StoredRecord {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            record,
        };
        fs::write(&path, serde_json::to_string_pretty(&stored)?).await?;

        tracing::debug!("Saved {}", path.display());
        Ok(())
    }

    async fn remove(&self, file: &str) -> Result<()> {
        let path = self.record_path(file);
        if path.exists() {
            fs::remove_file(&path).await?;
            tracing::debug!("Removed {}", path.display());
        }
        Ok(())
    }

    pub async fn load_deployment(&self) -> Result<Option<Deployment>> {
        self.load(DEPLOYMENT_FILE).await
    }

    pub async fn save_deployment(&self, deployment: &Deployment) -> Result<()> {
        self.save(DEPLOYMENT_FILE, deployment).await
    }

    pub async fn clear_deployment(&self) -> Result<()> {
        self.remove(DEPLOYMENT_FILE).await
    }

    pub async fn load_release(&self) -> Result<Option<Release>> {
        self.load(RELEASE_FILE).await
    }

    pub async fn save_release(&self, release: &Release) -> Result<()> {
        self.save(RELEASE_FILE, release).await
    }

    pub async fn clear_release(&self) -> Result<()> {
        self.remove(RELEASE_FILE).await
    }

    /// Take the project lock
    ///
    /// The lock file is created with `create_new`, so two commands racing
    /// for it cannot both win. A lock older than [`STALE_LOCK_HOURS`] is
    /// removed and the creation tried once more.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;
        let lock_path = self.lock_path();
        let holder = LockHolder::current();
        let body = serde_json::to_vec_pretty(&holder)?;

        for _ in 0..2 {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
                .await;

            match created {
                Ok(mut file) => {
                    file.write_all(&body).await?;
                    file.sync_all().await?;
                    tracing::debug!("Acquired state lock at {}", lock_path.display());
                    return Ok(StateLock {
                        path: lock_path,
                        held: true,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let current = read_holder(&lock_path).await?;
                    if !current.is_stale() {
                        return Err(CloudError::LockError(format!(
                            "state is locked by {} since {} ({})",
                            current.holder,
                            current.acquired_at,
                            lock_path.display()
                        )));
                    }
                    tracing::warn!("Removing stale lock held by {}", current.holder);
                    remove_if_present(&lock_path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CloudError::LockError(format!(
            "{} was re-created while clearing a stale lock",
            lock_path.display()
        )))
    }
}

/// Contents of the lock file
#[derive(Debug, Serialize, Deserialize)]
struct LockHolder {
    holder: String,
    pid: u32,
    acquired_at: DateTime<Utc>,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }

    fn is_stale(&self) -> bool {
        Utc::now()
            .signed_duration_since(self.acquired_at)
            .num_hours()
            >= STALE_LOCK_HOURS
    }
}

/// An unparsable lock may be one another command is still writing
async fn read_holder(path: &Path) -> Result<LockHolder> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| {
        CloudError::LockError(format!(
            "{} is unreadable ({}); remove it if no other command is running",
            path.display(),
            e
        ))
    })
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Held project lock; removed on [`StateLock::release`] or drop
pub struct StateLock {
    path: PathBuf,
    held: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.held = false;
        remove_if_present(&self.path).await?;
        tracing::debug!("Released state lock");
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if self.held {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_deployment_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path());

        let deployment = Deployment::new("site", "proj", Some("us-east1".to_string()));
        store.save_deployment(&deployment).await.unwrap();

        let loaded = store.load_deployment().await.unwrap().unwrap();
        assert_eq!(loaded, deployment);
    }

    #[tokio::test]
    async fn test_missing_records_load_as_none() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path());

        assert!(store.load_deployment().await.unwrap().is_none());
        assert!(store.load_release().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_backup_and_clear_removes() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path());

        let first = Release::new("https://a.example.com", "site", "proj", None);
        let second = Release::new("https://b.example.com", "site", "proj", None);
        store.save_release(&first).await.unwrap();
        store.save_release(&second).await.unwrap();

        assert!(store.state_dir().join("release.json.backup").exists());
        assert_eq!(
            store.load_release().await.unwrap().unwrap().url(),
            "https://b.example.com"
        );

        store.clear_release().await.unwrap();
        assert!(store.load_release().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path());

        let lock = store.acquire_lock().await.unwrap();
        assert!(matches!(
            store.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = store.acquire_lock().await.unwrap();
        drop(again);
        assert!(!store.state_dir().join("lock.json").exists());
    }

    #[tokio::test]
    async fn test_stale_lock_is_replaced() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path());
        std::fs::create_dir_all(store.state_dir()).unwrap();

        let stale = LockHolder {
            holder: "old-host".to_string(),
            pid: 1,
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        let lock_path = store.state_dir().join("lock.json");
        std::fs::write(&lock_path, serde_json::to_string(&stale).unwrap()).unwrap();

        let lock = store.acquire_lock().await.unwrap();
        let current: LockHolder =
            serde_json::from_str(&std::fs::read_to_string(&lock_path).unwrap()).unwrap();
        assert_eq!(current.pid, std::process::id());

        lock.release().await.unwrap();
        assert!(!lock_path.exists());
    }

    #[tokio::test]
    async fn test_half_written_lock_is_not_taken_over() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path());
        std::fs::create_dir_all(store.state_dir()).unwrap();
        let lock_path = store.state_dir().join("lock.json");
        std::fs::write(&lock_path, "").unwrap();

        assert!(matches!(
            store.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));
        assert!(lock_path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_acquire_has_one_winner() {
        let temp_dir = tempdir().unwrap();
        let first = RecordStore::new(temp_dir.path());
        let second = RecordStore::new(temp_dir.path());

        let (a, b) = tokio::join!(first.acquire_lock(), second.acquire_lock());

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }
}
