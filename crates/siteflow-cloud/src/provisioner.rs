//! Dependency-ordered creation of the CDN resource chain
//!
//! Every node is checked with `Exists` before anything is created, so a
//! run that failed part way can simply be repeated: resources that made it
//! are reported as found, and creation resumes at the first missing one.
//! The first failed creation stops the walk; nothing is rolled back.

use crate::action::{Action, ActionType, ApplyResult, Plan, StepOutcome};
use crate::backend::{ExistenceMode, ResourceBackend, ResourceHandle};
use crate::error::{CloudError, Result};
use crate::graph::ResourceGraph;

pub struct Provisioner<'a> {
    backend: &'a dyn ResourceBackend,
    mode: ExistenceMode,
}

impl<'a> Provisioner<'a> {
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

    /// Report what a provisioning run would create, issuing only lookups
    pub async fn plan(&self, graph: &ResourceGraph) -> Result<Plan> {
        let mut actions = Vec::new();

        for node in graph.provision_order() {
            let handle = ResourceHandle::new(node, self.backend, self.mode);
            let exists = handle
                .exists()
                .await
                .map_err(|e| CloudError::resource(node.kind, &node.name, "look up", e))?;

            let (action_type, description) = if exists {
                (ActionType::NoOp, format!("{} {} already exists", node.kind, node.name))
            } else {
                (ActionType::Create, format!("create {} {}", node.kind, node.name))
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

    /// Create every missing resource in dependency order
    pub async fn provision(&self, graph: &ResourceGraph, domains: &[String]) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for node in graph.provision_order() {
            let handle = ResourceHandle::new(node, self.backend, self.mode);

            let exists = handle
                .exists()
                .await
                .map_err(|e| CloudError::resource(node.kind, &node.name, "look up", e))?;

            if exists {
                tracing::info!("Found existing {}: {}", node.kind, node.name);
                result.record(node.kind, &node.name, StepOutcome::FoundExisting);
                continue;
            }

            tracing::info!("Creating {}: {}", node.kind, node.name);
            let params = graph.create_params(node.kind, domains);
            if let Err(e) = handle.create(&params).await {
                tracing::error!("Failed to create {} {}: {}", node.kind, node.name, e);
                return Err(CloudError::resource(node.kind, &node.name, "create", e));
            }
            result.record(node.kind, &node.name, StepOutcome::Created);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
