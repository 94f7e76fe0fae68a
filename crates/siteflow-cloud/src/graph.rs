//! Resource graph of the CDN chain
//!
//! All six nodes are derived from a single base identifier (the bucket
//! name). The graph is a fixed DAG; the provisioning order is a
//! topological order of it and the teardown order is its exact reverse.

use crate::error::{CloudError, Result};
use crate::resource::{CreateParams, ResourceKind, ResourceNode, validate_resource_name};
use std::collections::HashSet;

/// HTTPS port the forwarding rule listens on
pub const HTTPS_PORT: u16 = 443;

#[derive(Debug, Clone)]
pub struct ResourceGraph {
    base_id: String,
    nodes: Vec<ResourceNode>,
}

impl ResourceGraph {
    pub fn new(base_id: impl Into<String>) -> Result<Self> {
        let base_id = base_id.into();
        if base_id.trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "resource graph requires a non-empty base identifier".to_string(),
            ));
        }

        let nodes = ResourceKind::PROVISION_ORDER
            .iter()
            .map(|kind| ResourceNode::new(*kind, &base_id))
            .collect();

        Ok(Self { base_id, nodes })
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Nodes in provisioning order
    pub fn provision_order(&self) -> impl DoubleEndedIterator<Item = &ResourceNode> {
        self.nodes.iter()
    }

    /// Nodes in teardown order
    pub fn teardown_order(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter().rev()
    }

    pub fn node(&self, kind: ResourceKind) -> &ResourceNode {
        &self.nodes[kind.ordinal()]
    }

    pub fn name_of(&self, kind: ResourceKind) -> &str {
        &self.node(kind).name
    }

    /// Check that every node comes after all of its dependencies
    pub fn verify_order(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if let Some(missing) = node.depends_on.iter().find(|d| !seen.contains(*d)) {
                return Err(CloudError::InvalidConfig(format!(
                    "{} is ordered before its dependency {}",
                    node.kind, missing
                )));
            }
            seen.insert(node.kind);
        }
        Ok(())
    }

    /// Check that every derived name is a valid compute resource name
    ///
    /// The longest suffix is `-lb-forwarding-rule`, so base identifiers
    /// over 44 characters never fit.
    pub fn verify_names(&self) -> Result<()> {
        for node in &self.nodes {
            validate_resource_name(&node.name).map_err(|e| {
                CloudError::InvalidConfig(format!(
                    "bucket name '{}' cannot be used for the CDN chain: {}",
                    self.base_id, e
                ))
            })?;
        }
        Ok(())
    }

    /// Build the creation parameters for a node
    pub fn create_params(&self, kind: ResourceKind, domains: &[String]) -> CreateParams {
        match kind {
            ResourceKind::IpAddress => CreateParams::IpAddress,
            ResourceKind::BackendBucket => CreateParams::BackendBucket {
                bucket: self.base_id.clone(),
            },
            ResourceKind::UrlMap => CreateParams::UrlMap {
                backend_bucket: self.name_of(ResourceKind::BackendBucket).to_string(),
            },
            ResourceKind::SslCertificate => CreateParams::SslCertificate {
                domains: domains.to_vec(),
            },
            ResourceKind::HttpsProxy => CreateParams::HttpsProxy {
                url_map: self.name_of(ResourceKind::UrlMap).to_string(),
                ssl_certificate: self.name_of(ResourceKind::SslCertificate).to_string(),
            },
            ResourceKind::ForwardingRule => CreateParams::ForwardingRule {
                address: self.name_of(ResourceKind::IpAddress).to_string(),
                target_proxy: self.name_of(ResourceKind::HttpsProxy).to_string(),
                port: HTTPS_PORT,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_order_is_topological() {
        let graph = ResourceGraph::new("site").unwrap();
        graph.verify_order().unwrap();
    }

    #[test]
    fn test_teardown_is_exact_reverse() {
        let graph = ResourceGraph::new("site").unwrap();
        let forward: Vec<_> = graph.provision_order().map(|n| n.kind).collect();
        let mut backward: Vec<_> = graph.teardown_order().map(|n| n.kind).collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(
            graph.teardown_order().next().map(|n| n.kind),
            Some(ResourceKind::ForwardingRule)
        );
    }

    #[test]
    fn test_empty_base_id_rejected() {
        assert!(matches!(
            ResourceGraph::new("  "),
            Err(CloudError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_verify_names() {
        ResourceGraph::new("my-site").unwrap().verify_names().unwrap();
        ResourceGraph::new("a".repeat(44)).unwrap().verify_names().unwrap();

        for base in ["www.example.com".to_string(), "a".repeat(45), "my_site".to_string()] {
            let graph = ResourceGraph::new(base.clone()).unwrap();
            assert!(
                matches!(graph.verify_names(), Err(CloudError::InvalidConfig(_))),
                "{base} should be rejected"
            );
        }
    }

    #[test]
    fn test_create_params_reference_sibling_names() {
        let graph = ResourceGraph::new("site").unwrap();

        assert_eq!(
            graph.create_params(ResourceKind::HttpsProxy, &[]),
            CreateParams::HttpsProxy {
                url_map: "site-lb".to_string(),
                ssl_certificate: "site-cert".to_string(),
            }
        );
        assert_eq!(
            graph.create_params(ResourceKind::ForwardingRule, &[]),
            CreateParams::ForwardingRule {
                address: "site-ip".to_string(),
                target_proxy: "site-lb-proxy".to_string(),
                port: 443,
            }
        );
        assert_eq!(
            graph.create_params(ResourceKind::SslCertificate, &["example.com".to_string()]),
            CreateParams::SslCertificate {
                domains: vec!["example.com".to_string()],
            }
        );
    }
}
