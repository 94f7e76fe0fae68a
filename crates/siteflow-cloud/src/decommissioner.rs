//! Reverse-order teardown of the CDN resource chain
//!
//! Mirrors the provisioner: resources that are already gone are skipped,
//! and the first failed deletion stops the walk with every earlier-created
//! resource left in place.

use crate::action::{Action, ActionType, ApplyResult, Plan, StepOutcome};
use crate::backend::{ExistenceMode, ResourceBackend, ResourceHandle};
use crate::error::{CloudError, Result};
use crate::graph::ResourceGraph;

pub struct Decommissioner<'a> {
    backend: &'a dyn ResourceBackend,
    mode: ExistenceMode,
}

impl<'a> Decommissioner<'a> {
    pub fn new(backend: &'a dyn ResourceBackend) -> Self {
        Self {
            backend,
            mode: ExistenceMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExistenceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Report what a teardown run would delete, issuing only lookups
    pub async fn plan(&self, graph: &ResourceGraph) -> Result<Plan> {
        let mut actions = Vec::new();

        for node in graph.teardown_order() {
            let handle = ResourceHandle::new(node, self.backend, self.mode);
            let exists = handle
                .exists()
                .await
                .map_err(|e| CloudError::resource(node.kind, &node.name, "look up", e))?;

            let (action_type, description) = if exists {
                (ActionType::Delete, format!("delete {} {}", node.kind, node.name))
            } else {
                (ActionType::NoOp, format!("{} {} already absent", node.kind, node.name))
            };

            actions.push(Action {
                action_type,
                kind: node.kind,
                name: node.name.clone(),
                description,
            });
        }

        Ok(Plan::new(actions))
    }

    /// Delete every existing resource in reverse dependency order
    pub async fn decommission(&self, graph: &ResourceGraph) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for node in graph.teardown_order() {
            let handle = ResourceHandle::new(node, self.backend, self.mode);

            let exists = handle
                .exists()
                .await
                .map_err(|e| CloudError::resource(node.kind, &node.name, "look up", e))?;

            if !exists {
                tracing::debug!("{} {} already absent", node.kind, node.name);
                result.record(node.kind, &node.name, StepOutcome::AlreadyAbsent);
                continue;
            }

            tracing::info!("Destroying {}: {}", node.kind, node.name);
            if let Err(e) = handle.destroy().await {
                tracing::error!("Failed to destroy {} {}: {}", node.kind, node.name, e);
                return Err(CloudError::resource(node.kind, &node.name, "destroy", e));
            }
            result.record(node.kind, &node.name, StepOutcome::Destroyed);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
