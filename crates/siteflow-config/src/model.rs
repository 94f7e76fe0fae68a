//! Site configuration model

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default index document served for directory requests
pub const DEFAULT_INDEX_PAGE: &str = "index.html";

/// Complete configuration of one static site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Bucket stage settings
    pub deploy: DeployConfig,

    /// CDN stage settings
    pub release: ReleaseConfig,

    /// File the configuration was loaded from
    pub source: Option<PathBuf>,
}

/// Bucket stage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Origin bucket name; also the base of every CDN resource name
    pub bucket: String,

    /// Cloud project identifier
    pub project: String,

    /// Bucket location (e.g. "us-east1"); provider default when unset
    pub region: Option<String>,

    /// Local directory mirrored into the bucket
    pub directory: PathBuf,

    /// Website main page suffix
    pub index_page: String,

    /// Website not-found page
    pub not_found_page: Option<String>,
}

/// CDN stage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Domains covered by the managed certificate
    pub domains: Vec<String>,
}

impl SiteConfig {
    /// Validate everything a full `up` needs
    pub fn validate(&self) -> Result<()> {
        self.deploy.validate()?;
        if !self.release.domains.is_empty() {
            self.release.primary_domain()?;
        }
        Ok(())
    }
}

impl DeployConfig {
    /// Check required fields and the source directory
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingField {
                section: "deploy",
                field: "bucket",
            });
        }
        validate_bucket_name(&self.bucket)?;

        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingField {
                section: "deploy",
                field: "project",
            });
        }

        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                section: "deploy",
                field: "directory",
            });
        }
        if !self.directory.is_dir() {
            return Err(ConfigError::DirectoryNotFound(self.directory.clone()));
        }

        Ok(())
    }
}

impl ReleaseConfig {
    /// Primary domain, required before any CDN resource is touched
    pub fn primary_domain(&self) -> Result<&str> {
        self.domains
            .first()
            .map(|d| d.as_str())
            .filter(|d| !d.trim().is_empty())
            .ok_or(ConfigError::MissingField {
                section: "release",
                field: "domain",
            })
    }

    /// Public URL served by the load balancer
    pub fn url(&self) -> Result<String> {
        Ok(format!("https://{}", self.primary_domain()?))
    }
}

/// Cloud Storage bucket naming rules
fn validate_bucket_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(ConfigError::Invalid(format!(
            "bucket name '{}' {}",
            name, reason
        )))
    };

    if name.len() < 3 || name.len() > 63 {
        return invalid("must be 3-63 characters long");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        return invalid("may only contain lowercase letters, digits, '-', '_' and '.'");
    }
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !alnum(name.chars().next()) || !alnum(name.chars().last()) {
        return invalid("must start and end with a letter or digit");
    }

    Ok(())
}
