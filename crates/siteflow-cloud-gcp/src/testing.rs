//! In-memory object storage for bucket stage tests

use crate::error::{GcpError, Result};
use crate::storage::{BucketSpec, IamPolicy, ObjectStorage, Website};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// A recorded storage call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    BucketExists,
    CreateBucket,
    SetWebsite,
    GetIamPolicy,
    SetIamPolicy,
    ListObjects,
    WriteObject(String),
    SetContentType(String, String),
    DeleteObject(String),
    DeleteBucket,
}

#[derive(Debug, Clone, Default)]
pub struct StoredBucket {
    pub spec: Option<BucketSpec>,
    pub website: Option<Website>,
    pub policy: IamPolicy,
    pub objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct Inner {
    buckets: HashMap<String, StoredBucket>,
    calls: Vec<StorageCall>,
    etag_counter: u64,
    fail_writes: HashSet<String>,
    fail_deletes: HashSet<String>,
    fail_content_types: HashSet<String>,
    exists_error: Option<String>,
    iam_conflicts: usize,
}

impl Inner {
    fn bucket(&mut self, name: &str) -> Result<&mut StoredBucket> {
        self.buckets.get_mut(name).ok_or_else(|| GcpError::Api {
            status: 404,
            message: "The specified bucket does not exist.".to_string(),
        })
    }

    fn next_etag(&mut self) -> String {
        self.etag_counter += 1;
        format!("etag-{}", self.etag_counter)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Storage that already holds `bucket` with the given objects
    pub fn with_bucket(bucket: &str, objects: &[&str]) -> Self {
        let storage = Self::new();
        {
            let mut inner = storage.lock();
            let etag = inner.next_etag();
            let entry = inner.buckets.entry(bucket.to_string()).or_default();
            entry.policy.etag = Some(etag);
            for name in objects {
                entry.objects.insert(name.to_string(), StoredObject::default());
            }
        }
        storage
    }

    /// Make uploads of `name` fail
    pub fn fail_write(&self, name: &str) {
        self.lock().fail_writes.insert(name.to_string());
    }

    /// Make the content type update of `name` fail
    pub fn fail_content_type(&self, name: &str) {
        self.lock().fail_content_types.insert(name.to_string());
    }

    /// Make deletion of object `name` fail
    pub fn fail_delete(&self, name: &str) {
        self.lock().fail_deletes.insert(name.to_string());
    }

    /// Make the bucket existence check fail with `message`
    pub fn fail_exists(&self, message: &str) {
        self.lock().exists_error = Some(message.to_string());
    }

    /// Simulate `count` concurrent policy writers racing the next updates
    pub fn inject_iam_conflicts(&self, count: usize) {
        self.lock().iam_conflicts = count;
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.lock().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<StorageCall> {
        std::mem::take(&mut self.lock().calls)
    }

    /// Number of calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&StorageCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn bucket(&self, name: &str) -> Option<StoredBucket> {
        self.lock().buckets.get(name).cloned()
    }

    pub fn object(&self, bucket: &str, name: &str) -> Option<StoredObject> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(name).cloned())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::BucketExists);
        if let Some(message) = inner.exists_error.clone() {
            return Err(GcpError::Api {
                status: 403,
                message,
            });
        }
        Ok(inner.buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::CreateBucket);
        if inner.buckets.contains_key(&spec.name) {
            return Err(GcpError::Api {
                status: 409,
                message: "Your previous request to create the named bucket succeeded and you already own it.".to_string(),
            });
        }
        let etag = inner.next_etag();
        let bucket = StoredBucket {
            spec: Some(spec.clone()),
            policy: IamPolicy {
                etag: Some(etag),
                ..Default::default()
            },
            ..Default::default()
        };
        inner.buckets.insert(spec.name.clone(), bucket);
        Ok(())
    }

    async fn set_website(&self, bucket: &str, website: &Website) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::SetWebsite);
        inner.bucket(bucket)?.website = Some(website.clone());
        Ok(())
    }

    async fn get_iam_policy(&self, bucket: &str) -> Result<IamPolicy> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::GetIamPolicy);
        Ok(inner.bucket(bucket)?.policy.clone())
    }

    async fn set_iam_policy(&self, bucket: &str, policy: &IamPolicy) -> Result<IamPolicy> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::SetIamPolicy);

        if inner.iam_conflicts > 0 {
            inner.iam_conflicts -= 1;
            let etag = inner.next_etag();
            inner.bucket(bucket)?.policy.etag = Some(etag);
        }

        let etag = inner.next_etag();
        let stored = inner.bucket(bucket)?;
        if stored.policy.etag != policy.etag {
            return Err(GcpError::PreconditionFailed(
                "At least one of the pre-conditions you specified did not hold.".to_string(),
            ));
        }

        stored.policy = policy.clone();
        stored.policy.etag = Some(etag);
        Ok(stored.policy.clone())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::ListObjects);
        Ok(inner.bucket(bucket)?.objects.keys().cloned().collect())
    }

    async fn write_object(&self, bucket: &str, name: &str, data: Vec<u8>) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::WriteObject(name.to_string()));
        if inner.fail_writes.contains(name) {
            return Err(GcpError::Api {
                status: 503,
                message: "Backend Error".to_string(),
            });
        }
        inner.bucket(bucket)?.objects.insert(
            name.to_string(),
            StoredObject {
                data,
                content_type: None,
            },
        );
        Ok(())
    }

    async fn set_content_type(&self, bucket: &str, name: &str, content_type: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::SetContentType(
            name.to_string(),
            content_type.to_string(),
        ));
        if inner.fail_content_types.contains(name) {
            return Err(GcpError::Api {
                status: 429,
                message: "The object exceeded the rate limit for object mutation operations."
                    .to_string(),
            });
        }
        let object = inner
            .bucket(bucket)?
            .objects
            .get_mut(name)
            .ok_or_else(|| GcpError::Api {
                status: 404,
                message: format!("No such object: {}/{}", bucket, name),
            })?;
        object.content_type = Some(content_type.to_string());
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::DeleteObject(name.to_string()));
        if inner.fail_deletes.contains(name) {
            return Err(GcpError::Api {
                status: 403,
                message: format!("Access denied deleting {}", name),
            });
        }
        inner.bucket(bucket)?.objects.remove(name);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StorageCall::DeleteBucket);
        let stored = inner.bucket(bucket)?;
        if !stored.objects.is_empty() {
            return Err(GcpError::Api {
                status: 409,
                message: "The bucket you tried to delete is not empty.".to_string(),
            });
        }
        inner.buckets.remove(bucket);
        Ok(())
    }
}
