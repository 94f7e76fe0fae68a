//! CDN stage
//!
//! Puts the HTTPS load balancer chain in front of a deployed bucket and
//! takes it down again.

use crate::error::Result;
use siteflow_cloud::{
    Action, ActionType, ApplyResult, Decommissioner, Deployment, ExistenceMode, Plan,
    Provisioner, Release, ResourceBackend, ResourceGraph, ResourceKind, StepOutcome,
};
use siteflow_config::ReleaseConfig;

/// Result of a CDN stage run
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub release: Release,
    pub apply: ApplyResult,
}

pub struct CdnStage<'a> {
    backend: &'a dyn ResourceBackend,
    mode: ExistenceMode,
}

impl<'a> CdnStage<'a> {
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

    /// Resources a release would create, issuing only lookups
    pub async fn plan(&self, deployment: &Deployment) -> Result<Plan> {
        deployment.validate()?;
        let graph = ResourceGraph::new(deployment.bucket())?;
        graph.verify_names()?;
        Ok(Provisioner::new(self.backend)
            .with_mode(self.mode)
            .plan(&graph)
            .await?)
    }

    /// Provision the chain for `deployment`
    pub async fn release(
        &self,
        deployment: &Deployment,
        config: &ReleaseConfig,
    ) -> Result<ReleaseOutcome> {
        deployment.validate()?;
        let url = config.url()?;
        let graph = ResourceGraph::new(deployment.bucket())?;
        graph.verify_names()?;

        tracing::info!("Releasing {} to Cloud CDN", deployment.bucket());
        let apply = Provisioner::new(self.backend)
            .with_mode(self.mode)
            .provision(&graph, &config.domains)
            .await?;

        let ip = graph.node(ResourceKind::IpAddress);
        let address = match self.backend.read_address(ip).await {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!("Could not read back address of {}: {}", ip.name, e);
                None
            }
        };
        if let Some(address) = &address {
            tracing::info!("Point {} at {}", url, address);
        }

        Ok(ReleaseOutcome {
            release: Release::new(url, deployment.bucket(), deployment.project(), address),
            apply,
        })
    }

    /// Resources a teardown would delete, issuing only lookups
    pub async fn teardown_plan(&self, release: &Release) -> Result<Plan> {
        release.validate()?;
        let graph = ResourceGraph::new(release.bucket())?;
        if unreachable_chain(&graph) {
            let actions = graph
                .teardown_order()
                .map(|node| Action {
                    action_type: ActionType::NoOp,
                    kind: node.kind,
                    name: node.name.clone(),
                    description: format!("{} {} cannot exist", node.kind, node.name),
                })
                .collect();
            return Ok(Plan::new(actions));
        }
        Ok(Decommissioner::new(self.backend)
            .with_mode(self.mode)
            .plan(&graph)
            .await?)
    }

    /// Tear down the chain addressed by `release`
    pub async fn destroy(&self, release: &Release) -> Result<ApplyResult> {
        release.validate()?;
        let graph = ResourceGraph::new(release.bucket())?;

        if unreachable_chain(&graph) {
            let mut result = ApplyResult::new();
            for node in graph.teardown_order() {
                result.record(node.kind, &node.name, StepOutcome::AlreadyAbsent);
            }
            return Ok(result);
        }

        tracing::info!("Destroying Cloud CDN resources for {}", release.bucket());
        Ok(Decommissioner::new(self.backend)
            .with_mode(self.mode)
            .decommission(&graph)
            .await?)
    }
}

/// A chain whose names the provider would reject was never created
fn unreachable_chain(graph: &ResourceGraph) -> bool {
    match graph.verify_names() {
        Ok(()) => false,
        Err(e) => {
            tracing::info!("No Cloud CDN resources to destroy: {}", e);
            true
        }
    }
}
