use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Site config file not found. Checked:\n\
        - current directory: site.local.kdl, .site.local.kdl, site.kdl, .site.kdl\n\
        - ./.siteflow/ directory\n\
        - ~/.config/siteflow/site.kdl\n\
        Set SITE_CONFIG_PATH to point at a file directly"
    )]
    SiteFileNotFound,

    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Missing required attribute '{field}' in {section} block")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    #[error("Unknown node '{name}' in {section}")]
    UnknownNode { section: &'static str, name: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Source directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
