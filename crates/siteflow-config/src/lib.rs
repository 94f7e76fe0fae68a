pub mod error;
pub mod model;
pub mod parser;

pub use error::*;
pub use model::*;
pub use parser::{parse_site_file, parse_site_string};

use std::path::{Path, PathBuf};

const SITE_FILE_CANDIDATES: [&str; 4] =
    ["site.local.kdl", ".site.local.kdl", "site.kdl", ".site.kdl"];

/// Get the SiteFlow global config directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("siteflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the project's site.kdl
///
/// Search order:
/// 1. `SITE_CONFIG_PATH` (direct path)
/// 2. current directory: site.local.kdl, .site.local.kdl, site.kdl, .site.kdl
/// 3. the same names inside `./.siteflow/`
/// 4. `~/.config/siteflow/site.kdl`
pub fn find_site_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("SITE_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("SITE_CONFIG_PATH points at a missing file: {}", path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &SITE_FILE_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let site_dir = current_dir.join(".siteflow");
    if site_dir.is_dir() {
        for filename in &SITE_FILE_CANDIDATES {
            let path = site_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("siteflow").join("site.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::SiteFileNotFound)
}

/// Load the site configuration
///
/// An explicit path wins over discovery. Only the syntax is checked here;
/// each stage validates the section it consumes.
pub fn load_site_config(path: Option<&Path>) -> Result<SiteConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => find_site_file()?,
    };
    tracing::debug!("Loading site config from {}", path.display());

    parse_site_file(&path)
}
