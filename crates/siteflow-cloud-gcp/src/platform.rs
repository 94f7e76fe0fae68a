//! Bucket stage
//!
//! `deploy` prepares the origin bucket and uploads the site; `destroy`
//! removes both.

use crate::bucket::{BucketManager, BucketStatus, BucketTeardown};
use crate::error::Result;
use crate::storage::{BucketSpec, ObjectStorage, Website};
use crate::sync::{AssetSync, SyncReport};
use siteflow_cloud::Deployment;
use siteflow_config::DeployConfig;

/// Result of a bucket stage run
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub deployment: Deployment,
    pub bucket: BucketStatus,
    pub sync: SyncReport,
}

pub struct BucketStage<'a> {
    storage: &'a dyn ObjectStorage,
}

impl<'a> BucketStage<'a> {
    pub fn new(storage: &'a dyn ObjectStorage) -> Self {
        Self { storage }
    }

    /// Ensure the bucket and upload the site directory
    ///
    /// Upload failures are reported in [`DeployOutcome::sync`] and do not
    /// fail the stage.
    pub async fn deploy(&self, config: &DeployConfig) -> Result<DeployOutcome> {
        config.validate()?;

        let spec = BucketSpec {
            name: config.bucket.clone(),
            project: config.project.clone(),
            location: config.region.clone(),
            uniform_access: true,
        };
        let website = Website {
            main_page_suffix: config.index_page.clone(),
            not_found_page: config.not_found_page.clone(),
        };

        let bucket = BucketManager::new(self.storage)
            .ensure(&spec, &website)
            .await?;

        tracing::info!("Uploading static files from {}", config.directory.display());
        let sync = AssetSync::new(self.storage, &config.bucket)
            .sync(&config.directory)
            .await;

        if sync.is_clean() {
            tracing::info!("Uploaded {} files", sync.uploaded.len());
        } else {
            tracing::warn!(
                "Some static files failed to upload ({} of {})",
                sync.errors.len(),
                sync.errors.len() + sync.uploaded.len()
            );
        }

        Ok(DeployOutcome {
            deployment: Deployment::new(
                config.bucket.clone(),
                config.project.clone(),
                config.region.clone(),
            ),
            bucket,
            sync,
        })
    }

    /// Delete the bucket and everything in it
    pub async fn destroy(&self, deployment: &Deployment) -> Result<BucketTeardown> {
        deployment.validate()?;
        BucketManager::new(self.storage)
            .destroy(deployment.bucket())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GcpError;
    use crate::testing::{MemoryStorage, StorageCall};
    use siteflow_config::ConfigError;
    use std::fs;

    fn config(dir: &std::path::Path) -> DeployConfig {
        DeployConfig {
            bucket: "my-site".to_string(),
            project: "proj".to_string(),
            region: Some("us-east1".to_string()),
            directory: dir.to_path_buf(),
            index_page: "index.html".to_string(),
            not_found_page: Some("404.html".to_string()),
        }
    }

    #[tokio::test]
    async fn test_deploy_produces_deployment() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let storage = MemoryStorage::new();

        let outcome = BucketStage::new(&storage)
            .deploy(&config(dir.path()))
            .await
            .unwrap();

        assert_eq!(outcome.deployment.bucket(), "my-site");
        assert_eq!(outcome.deployment.project(), "proj");
        assert_eq!(outcome.deployment.region(), Some("us-east1"));
        assert!(outcome.bucket.created);
        assert_eq!(outcome.sync.uploaded.len(), 1);
    }

    #[tokio::test]
    async fn test_deploy_soft_fails_uploads() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("b.css"), "p {}").unwrap();
        let storage = MemoryStorage::new();
        storage.fail_write("b.css");

        let outcome = BucketStage::new(&storage)
            .deploy(&config(dir.path()))
            .await
            .unwrap();

        assert_eq!(outcome.sync.errors.len(), 1);
        assert_eq!(outcome.sync.uploaded.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_issues_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MemoryStorage::new();
        let mut config = config(dir.path());
        config.project.clear();

        let err = BucketStage::new(&storage).deploy(&config).await.unwrap_err();

        assert!(matches!(
            err,
            GcpError::Config(ConfigError::MissingField { .. })
        ));
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_after_deploy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let storage = MemoryStorage::new();
        let stage = BucketStage::new(&storage);

        let outcome = stage.deploy(&config(dir.path())).await.unwrap();
        let teardown = stage.destroy(&outcome.deployment).await.unwrap();
        assert_eq!(teardown.objects_deleted, 1);

        storage.take_calls();
        let again = stage.destroy(&outcome.deployment).await.unwrap();
        assert!(!again.existed);
        assert_eq!(
            storage.count(|c| matches!(c, StorageCall::DeleteObject(_))),
            0
        );
    }
}
