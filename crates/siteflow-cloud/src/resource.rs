//! Resource kinds of the CDN chain and their naming rules

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};

/// Longest name a compute resource may have
pub const MAX_RESOURCE_NAME_LEN: usize = 63;

/// The six networking resources that front the origin bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    IpAddress,
    BackendBucket,
    UrlMap,
    SslCertificate,
    HttpsProxy,
    ForwardingRule,
}

impl ResourceKind {
    /// All kinds in provisioning order (roots before dependents)
    pub const PROVISION_ORDER: [ResourceKind; 6] = [
        ResourceKind::IpAddress,
        ResourceKind::BackendBucket,
        ResourceKind::UrlMap,
        ResourceKind::SslCertificate,
        ResourceKind::HttpsProxy,
        ResourceKind::ForwardingRule,
    ];

    /// Position in [`ResourceKind::PROVISION_ORDER`]
    pub fn ordinal(self) -> usize {
        match self {
            ResourceKind::IpAddress => 0,
            ResourceKind::BackendBucket => 1,
            ResourceKind::UrlMap => 2,
            ResourceKind::SslCertificate => 3,
            ResourceKind::HttpsProxy => 4,
            ResourceKind::ForwardingRule => 5,
        }
    }

    /// Fixed name suffix appended to the base identifier
    pub fn suffix(self) -> &'static str {
        match self {
            ResourceKind::IpAddress => "ip",
            ResourceKind::BackendBucket => "backend-bucket",
            ResourceKind::UrlMap => "lb",
            ResourceKind::SslCertificate => "cert",
            ResourceKind::HttpsProxy => "lb-proxy",
            ResourceKind::ForwardingRule => "lb-forwarding-rule",
        }
    }

    /// Kinds that must exist before this one can be created
    pub fn depends_on(self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::IpAddress | ResourceKind::BackendBucket | ResourceKind::SslCertificate => {
                &[]
            }
            ResourceKind::UrlMap => &[ResourceKind::BackendBucket],
            ResourceKind::HttpsProxy => &[ResourceKind::UrlMap, ResourceKind::SslCertificate],
            ResourceKind::ForwardingRule => &[ResourceKind::IpAddress, ResourceKind::HttpsProxy],
        }
    }

    /// Deterministic resource name for a base identifier (the bucket name)
    pub fn resource_name(self, base_id: &str) -> String {
        format!("{}-{}", base_id, self.suffix())
    }

    /// Human readable label used in status output
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::IpAddress => "IP address",
            ResourceKind::BackendBucket => "backend bucket",
            ResourceKind::UrlMap => "URL map",
            ResourceKind::SslCertificate => "SSL certificate",
            ResourceKind::HttpsProxy => "HTTPS proxy",
            ResourceKind::ForwardingRule => "forwarding rule",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Check a compute resource name: `[a-z]([-a-z0-9]*[a-z0-9])?`, at most
/// [`MAX_RESOURCE_NAME_LEN`] characters
pub fn validate_resource_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(CloudError::InvalidConfig(format!(
            "resource name '{}' {}",
            name, reason
        )))
    };

    if name.is_empty() || name.len() > MAX_RESOURCE_NAME_LEN {
        return invalid("must be 1-63 characters long");
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return invalid("must start with a lowercase letter");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("may only contain lowercase letters, digits and '-'");
    }
    if name.ends_with('-') {
        return invalid("must not end with '-'");
    }

    Ok(())
}

/// A node of the resource graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub kind: ResourceKind,
    pub name: String,
    pub depends_on: Vec<ResourceKind>,
}

impl ResourceNode {
    pub fn new(kind: ResourceKind, base_id: &str) -> Self {
        Self {
            kind,
            name: kind.resource_name(base_id),
            depends_on: kind.depends_on().to_vec(),
        }
    }
}

/// Parameters required to create a resource of a given kind
///
/// Names of other resources are always the deterministic names of the
/// nodes they refer to, so a resource never points at a differently named
/// sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateParams {
    IpAddress,
    BackendBucket {
        bucket: String,
    },
    UrlMap {
        backend_bucket: String,
    },
    SslCertificate {
        domains: Vec<String>,
    },
    HttpsProxy {
        url_map: String,
        ssl_certificate: String,
    },
    ForwardingRule {
        address: String,
        target_proxy: String,
        port: u16,
    },
}

impl CreateParams {
    pub fn kind(&self) -> ResourceKind {
        match self {
            CreateParams::IpAddress => ResourceKind::IpAddress,
            CreateParams::BackendBucket { .. } => ResourceKind::BackendBucket,
            CreateParams::UrlMap { .. } => ResourceKind::UrlMap,
            CreateParams::SslCertificate { .. } => ResourceKind::SslCertificate,
            CreateParams::HttpsProxy { .. } => ResourceKind::HttpsProxy,
            CreateParams::ForwardingRule { .. } => ResourceKind::ForwardingRule,
        }
    }
}
