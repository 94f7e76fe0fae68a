//! KDL parser for site.kdl

use crate::error::{ConfigError, Result};
use crate::model::{DEFAULT_INDEX_PAGE, DeployConfig, ReleaseConfig, SiteConfig};
use kdl::{KdlDocument, KdlNode};
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a site file; relative paths resolve against its directory
pub fn parse_site_file<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut config = parse_site_string(&content, base_dir)?;
    config.source = Some(path.to_path_buf());
    Ok(config)
}

/// Parse site configuration from a KDL string
pub fn parse_site_string(content: &str, base_dir: &Path) -> Result<SiteConfig> {
    let doc: KdlDocument = content.parse()?;
    let mut config = SiteConfig::default();
    config.deploy.index_page = DEFAULT_INDEX_PAGE.to_string();

    for node in doc.nodes() {
        match node.name().value() {
            "deploy" => config.deploy = parse_deploy(node, base_dir)?,
            "release" => config.release = parse_release(node)?,
            other => {
                return Err(ConfigError::UnknownNode {
                    section: "site file",
                    name: other.to_string(),
                });
            }
        }
    }

    Ok(config)
}

fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn parse_deploy(node: &KdlNode, base_dir: &Path) -> Result<DeployConfig> {
    let mut deploy = DeployConfig {
        index_page: DEFAULT_INDEX_PAGE.to_string(),
        ..Default::default()
    };

    let Some(children) = node.children() else {
        return Ok(deploy);
    };

    for child in children.nodes() {
        match child.name().value() {
            "bucket" => deploy.bucket = first_string(child).unwrap_or_default(),
            "project" => deploy.project = first_string(child).unwrap_or_default(),
            "region" => deploy.region = first_string(child),
            "directory" => {
                if let Some(dir) = first_string(child) {
                    deploy.directory = resolve_dir(base_dir, &dir);
                }
            }
            "index" => {
                if let Some(index) = first_string(child) {
                    deploy.index_page = index;
                }
            }
            "not-found" => deploy.not_found_page = first_string(child),
            other => {
                return Err(ConfigError::UnknownNode {
                    section: "deploy",
                    name: other.to_string(),
                });
            }
        }
    }

    Ok(deploy)
}

fn parse_release(node: &KdlNode) -> Result<ReleaseConfig> {
    let mut release = ReleaseConfig::default();

    let Some(children) = node.children() else {
        return Ok(release);
    };

    for child in children.nodes() {
        match child.name().value() {
            // domain "a.example.com" "b.example.com"
            "domain" => release.domains.extend(
                child
                    .entries()
                    .iter()
                    .filter_map(|e| e.value().as_string())
                    .map(|s| s.to_string()),
            ),
            other => {
                return Err(ConfigError::UnknownNode {
                    section: "release",
                    name: other.to_string(),
                });
            }
        }
    }

    Ok(release)
}

fn resolve_dir(base_dir: &Path, dir: &str) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
