//! Origin bucket lifecycle
//!
//! Creates and configures the bucket the CDN serves from, and deletes it
//! together with its objects on teardown.

use crate::error::{GcpError, Result};
use crate::storage::{BucketSpec, ObjectStorage, Website};

/// Role granting anonymous read access to objects
pub const PUBLIC_READ_ROLE: &str = "roles/storage.objectViewer";
pub const ALL_USERS: &str = "allUsers";

/// Attempts of the IAM read-modify-write before giving up
const IAM_MAX_ATTEMPTS: usize = 3;

/// Provider message for a bucket the caller already owns
const ALREADY_OWNED: &str = "already own";

/// What [`BucketManager::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketStatus {
    pub created: bool,
    pub public_granted: bool,
}

/// What [`BucketManager::destroy`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketTeardown {
    pub existed: bool,
    pub objects_deleted: usize,
}

pub struct BucketManager<'a> {
    storage: &'a dyn ObjectStorage,
}

impl<'a> BucketManager<'a> {
    pub fn new(storage: &'a dyn ObjectStorage) -> Self {
        Self { storage }
    }

    /// Create the bucket when missing, then apply website and public-read
    /// settings
    pub async fn ensure(&self, spec: &BucketSpec, website: &Website) -> Result<BucketStatus> {
        let created = if self.exists_for_create(&spec.name).await {
            tracing::info!("Found existing bucket {}", spec.name);
            false
        } else {
            tracing::info!("Bucket {} not found, creating", spec.name);
            match self.storage.create_bucket(spec).await {
                Ok(()) => {
                    tracing::info!("Bucket {} created", spec.name);
                    true
                }
                Err(e) if is_already_owned(&e) => {
                    tracing::info!("Found existing bucket {}", spec.name);
                    false
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!("Configuring {} for website hosting", spec.name);
        self.storage.set_website(&spec.name, website).await?;

        let public_granted = self.ensure_public(&spec.name).await?;
        tracing::info!("Objects within {} are publicly readable", spec.name);

        Ok(BucketStatus {
            created,
            public_granted,
        })
    }

    /// Existence as seen by the create path: an "already owned" failure
    /// means found, any other failure means missing
    async fn exists_for_create(&self, bucket: &str) -> bool {
        match self.storage.bucket_exists(bucket).await {
            Ok(found) => found,
            Err(e) if is_already_owned(&e) => true,
            Err(e) => {
                tracing::debug!("Bucket lookup for {} failed, treating as missing: {}", bucket, e);
                false
            }
        }
    }

    /// Grant `allUsers` object read access unless already granted
    ///
    /// Returns true when the policy was changed.
    pub async fn ensure_public(&self, bucket: &str) -> Result<bool> {
        let mut attempt = 1;
        loop {
            let mut policy = self.storage.get_iam_policy(bucket).await?;
            if policy.grants(PUBLIC_READ_ROLE, ALL_USERS) {
                return Ok(false);
            }

            policy.add_member(PUBLIC_READ_ROLE, ALL_USERS);
            match self.storage.set_iam_policy(bucket, &policy).await {
                Ok(_) => return Ok(true),
                Err(GcpError::PreconditionFailed(msg)) if attempt < IAM_MAX_ATTEMPTS => {
                    tracing::debug!(
                        "IAM policy of {} changed during update (attempt {}): {}",
                        bucket,
                        attempt,
                        msg
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delete every object and then the bucket
    ///
    /// A missing bucket is success. The first failed object deletion aborts.
    pub async fn destroy(&self, bucket: &str) -> Result<BucketTeardown> {
        if !self.storage.bucket_exists(bucket).await? {
            tracing::info!("Bucket {} does not exist", bucket);
            return Ok(BucketTeardown {
                existed: false,
                objects_deleted: 0,
            });
        }

        tracing::info!("Destroying objects in {}", bucket);
        let objects = self.storage.list_objects(bucket).await?;
        for name in &objects {
            self.storage.delete_object(bucket, name).await?;
            tracing::debug!("Deleted gs://{}/{}", bucket, name);
        }

        tracing::info!("Destroying bucket {}", bucket);
        self.storage.delete_bucket(bucket).await?;

        Ok(BucketTeardown {
            existed: true,
            objects_deleted: objects.len(),
        })
    }
}

/// The provider's answer for a bucket the caller already owns
fn is_already_owned(err: &GcpError) -> bool {
    err.to_string().contains(ALREADY_OWNED)
}
