//! In-memory backend for lifecycle tests
//!
//! Keeps a set of existing resources and records every call in order.
//! Failures can be injected per resource kind.

use crate::backend::ResourceBackend;
use crate::error::{CloudError, Result};
use crate::resource::{CreateParams, ResourceKind, ResourceNode};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// A recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Describe(ResourceKind),
    Create(ResourceKind, CreateParams),
    Delete(ResourceKind),
    ReadAddress,
}

#[derive(Default)]
struct Inner {
    existing: HashSet<ResourceKind>,
    calls: Vec<Call>,
    fail_create: HashSet<ResourceKind>,
    fail_delete: HashSet<ResourceKind>,
    fail_describe: HashSet<ResourceKind>,
}

/// Address reported for an existing IP resource
pub const TEST_ADDRESS: &str = "203.0.113.10";

#[derive(Default)]
pub struct RecordingBackend {
    inner: Mutex<Inner>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend where the given resources already exist
    pub fn with_existing(kinds: &[ResourceKind]) -> Self {
        let backend = Self::new();
        backend.lock().existing.extend(kinds.iter().copied());
        backend
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_create(&self, kind: ResourceKind) {
        self.lock().fail_create.insert(kind);
    }

    pub fn fail_delete(&self, kind: ResourceKind) {
        self.lock().fail_delete.insert(kind);
    }

    pub fn fail_describe(&self, kind: ResourceKind) {
        self.lock().fail_describe.insert(kind);
    }

    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.fail_create.clear();
        inner.fail_delete.clear();
        inner.fail_describe.clear();
    }

    pub fn exists(&self, kind: ResourceKind) -> bool {
        self.lock().existing.contains(&kind)
    }

    pub fn existing_count(&self) -> usize {
        self.lock().existing.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Drain the call log
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.lock().calls)
    }

    /// Kinds that received a creation call, in order
    pub fn created(&self) -> Vec<ResourceKind> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(kind, _) => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// Kinds that received a deletion call, in order
    pub fn deleted(&self) -> Vec<ResourceKind> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ResourceBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn describe(&self, node: &ResourceNode) -> Result<bool> {
        let mut inner = self.lock();
        inner.calls.push(Call::Describe(node.kind));
        if inner.fail_describe.contains(&node.kind) {
            return Err(CloudError::CommandFailed(
                "ERROR: (gcloud) backendError: service unavailable".to_string(),
            ));
        }
        Ok(inner.existing.contains(&node.kind))
    }

    async fn create(&self, node: &ResourceNode, params: &CreateParams) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Create(node.kind, params.clone()));
        if inner.fail_create.contains(&node.kind) {
            return Err(CloudError::CommandFailed(format!(
                "ERROR: (gcloud) could not create {}",
                node.name
            )));
        }
        if !inner.existing.insert(node.kind) {
            return Err(CloudError::CommandFailed(format!(
                "ERROR: (gcloud) The resource '{}' already exists",
                node.name
            )));
        }
        Ok(())
    }

    async fn delete(&self, node: &ResourceNode) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Delete(node.kind));
        if inner.fail_delete.contains(&node.kind) {
            return Err(CloudError::CommandFailed(format!(
                "ERROR: (gcloud) The resource '{}' is already being used",
                node.name
            )));
        }
        if !inner.existing.remove(&node.kind) {
            return Err(CloudError::CommandFailed(format!(
                "ERROR: (gcloud) The resource '{}' was not found",
                node.name
            )));
        }
        Ok(())
    }

    async fn read_address(&self, node: &ResourceNode) -> Result<Option<String>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ReadAddress);
        if node.kind == ResourceKind::IpAddress && inner.existing.contains(&node.kind) {
            return Ok(Some(TEST_ADDRESS.to_string()));
        }
        Ok(None)
    }
}
