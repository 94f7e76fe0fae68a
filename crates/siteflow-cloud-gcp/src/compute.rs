//! CDN chain backend on `gcloud compute`

use crate::gcloud::Gcloud;
use async_trait::async_trait;
use siteflow_cloud::{CreateParams, ResourceBackend, ResourceKind, ResourceNode};

/// How a resource kind maps onto a gcloud collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub collection: &'static str,
    pub global: bool,
}

pub fn descriptor(kind: ResourceKind) -> Descriptor {
    let (collection, global) = match kind {
        ResourceKind::IpAddress => ("addresses", true),
        ResourceKind::BackendBucket => ("backend-buckets", false),
        ResourceKind::UrlMap => ("url-maps", false),
        ResourceKind::SslCertificate => ("ssl-certificates", true),
        ResourceKind::HttpsProxy => ("target-https-proxies", false),
        ResourceKind::ForwardingRule => ("forwarding-rules", true),
    };
    Descriptor { collection, global }
}

/// Collection-specific creation flags
pub fn create_args(params: &CreateParams) -> Vec<String> {
    match params {
        CreateParams::IpAddress => vec![
            "--network-tier=PREMIUM".to_string(),
            "--ip-version=IPV4".to_string(),
        ],
        CreateParams::BackendBucket { bucket } => vec![
            format!("--gcs-bucket-name={}", bucket),
            "--enable-cdn".to_string(),
        ],
        CreateParams::UrlMap { backend_bucket } => {
            vec![format!("--default-backend-bucket={}", backend_bucket)]
        }
        CreateParams::SslCertificate { domains } => {
            vec![format!("--domains={}", domains.join(","))]
        }
        CreateParams::HttpsProxy {
            url_map,
            ssl_certificate,
        } => vec![
            format!("--url-map={}", url_map),
            format!("--ssl-certificates={}", ssl_certificate),
        ],
        CreateParams::ForwardingRule {
            address,
            target_proxy,
            port,
        } => vec![
            format!("--address={}", address),
            format!("--target-https-proxy={}", target_proxy),
            format!("--ports={}", port),
        ],
    }
}

/// [`ResourceBackend`] that drives `gcloud compute`
pub struct GcloudBackend {
    gcloud: Gcloud,
}

impl GcloudBackend {
    pub fn new(gcloud: Gcloud) -> Self {
        Self { gcloud }
    }

    pub fn gcloud(&self) -> &Gcloud {
        &self.gcloud
    }
}

#[async_trait]
impl ResourceBackend for GcloudBackend {
    fn name(&self) -> &str {
        "gcloud"
    }

    async fn describe(&self, node: &ResourceNode) -> siteflow_cloud::Result<bool> {
        let d = descriptor(node.kind);
        Ok(self
            .gcloud
            .describe(d.collection, &node.name, d.global)
            .await?)
    }

    async fn create(
        &self,
        node: &ResourceNode,
        params: &CreateParams,
    ) -> siteflow_cloud::Result<()> {
        let d = descriptor(node.kind);
        self.gcloud
            .create(d.collection, &node.name, d.global, &create_args(params))
            .await?;
        Ok(())
    }

    async fn delete(&self, node: &ResourceNode) -> siteflow_cloud::Result<()> {
        let d = descriptor(node.kind);
        self.gcloud.delete(d.collection, &node.name, d.global).await?;
        Ok(())
    }

    async fn read_address(&self, node: &ResourceNode) -> siteflow_cloud::Result<Option<String>> {
        if node.kind != ResourceKind::IpAddress {
            return Ok(None);
        }
        let address = self.gcloud.address(&node.name).await?;
        Ok(Some(address).filter(|a| !a.is_empty()))
    }
}
