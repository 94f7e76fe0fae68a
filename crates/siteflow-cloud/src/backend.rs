//! Provider backend trait and the per-resource handle built on it

use crate::error::Result;
use crate::resource::{CreateParams, ResourceKind, ResourceNode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider operations for the CDN resource chain
///
/// The backend is the explicitly passed execution context: it carries the
/// provider credentials and project, and every handle reaches the provider
/// through it.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// Returns the backend name (e.g., "gcloud")
    fn name(&self) -> &str;

    /// Look up a resource by name
    ///
    /// `Ok(false)` means the provider definitely reported the resource as
    /// absent; `Err` means the query itself failed.
    async fn describe(&self, node: &ResourceNode) -> Result<bool>;

    /// Issue a creation request
    async fn create(&self, node: &ResourceNode, params: &CreateParams) -> Result<()>;

    /// Issue a deletion request
    async fn delete(&self, node: &ResourceNode) -> Result<()>;

    /// Read back the allocated address of an IP address resource
    async fn read_address(&self, _node: &ResourceNode) -> Result<Option<String>> {
        Ok(None)
    }
}

/// How existence checks treat failed queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceMode {
    /// Any failed query counts as "does not exist"
    #[default]
    Lenient,
    /// Only a definite "not found" counts as absent; other failures are errors
    Strict,
}

/// A named cloud object bound to a backend
pub struct ResourceHandle<'a> {
    node: &'a ResourceNode,
    backend: &'a dyn ResourceBackend,
    mode: ExistenceMode,
}

impl<'a> ResourceHandle<'a> {
    pub fn new(node: &'a ResourceNode, backend: &'a dyn ResourceBackend, mode: ExistenceMode) -> Self {
        Self {
            node,
            backend,
            mode,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.node.kind
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub async fn exists(&self) -> Result<bool> {
        match self.backend.describe(self.node).await {
            Ok(found) => Ok(found),
            Err(e) if self.mode == ExistenceMode::Lenient => {
                tracing::debug!(
                    "Treating failed lookup of {} {} as absent: {}",
                    self.node.kind,
                    self.node.name,
                    e
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Must only be called when [`ResourceHandle::exists`] returned false
    pub async fn create(&self, params: &CreateParams) -> Result<()> {
        self.backend.create(self.node, params).await
    }

    /// Must only be called when [`ResourceHandle::exists`] returned true
    pub async fn destroy(&self) -> Result<()> {
        self.backend.delete(self.node).await
    }
}
