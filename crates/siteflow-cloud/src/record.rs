//! Deployment and Release records
//!
//! Small value objects handed from the bucket stage to the CDN stage and
//! from the CDN stage to its own teardown. They carry only what is needed
//! to re-derive resource names; the provider remains the source of truth.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of the bucket stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    bucket: String,
    #[serde(default)]
    project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl Deployment {
    pub fn new(
        bucket: impl Into<String>,
        project: impl Into<String>,
        region: Option<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            project: project.into(),
            region,
            created_at: Utc::now(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reject a record that cannot address the bucket
    pub fn validate(&self) -> Result<()> {
        require("deployment", "bucket", &self.bucket)?;
        require("deployment", "project", &self.project)
    }
}

/// Output of the CDN stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    url: String,
    #[serde(default)]
    bucket: String,
    #[serde(default)]
    project: String,
    /// Reserved external IP, when it could be read back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl Release {
    pub fn new(
        url: impl Into<String>,
        bucket: impl Into<String>,
        project: impl Into<String>,
        address: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            bucket: bucket.into(),
            project: project.into(),
            address,
            created_at: Utc::now(),
        }
    }

    /// Addressing-only release for tearing down a chain whose release
    /// record was lost
    pub fn for_teardown(deployment: &Deployment) -> Self {
        Self::new(
            String::new(),
            deployment.bucket(),
            deployment.project(),
            None,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn validate(&self) -> Result<()> {
        require("release", "bucket", &self.bucket)?;
        require("release", "project", &self.project)
    }
}

fn require(record: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CloudError::InvalidConfig(format!(
            "{} record is missing required field '{}'",
            record, field
        )));
    }
    Ok(())
}
