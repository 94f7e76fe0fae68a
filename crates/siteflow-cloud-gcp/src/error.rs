//! Google Cloud provider error types

use siteflow_cloud::CloudError;
use siteflow_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("gcloud not found. Please install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install")]
    GcloudNotFound,

    #[error("gcloud authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Trimmed stderr of the failed command
    #[error("{0}")]
    CommandFailed(String),

    #[error("gcloud {0} timed out")]
    Timeout(String),

    #[error("Cloud Storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The IAM policy changed between read and write
    #[error("IAM policy was modified concurrently: {0}")]
    PreconditionFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GcpError {
    /// HTTP status of an API failure
    pub fn status(&self) -> Option<u16> {
        match self {
            GcpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Resource backends report failures as [`CloudError`]
impl From<GcpError> for CloudError {
    fn from(err: GcpError) -> Self {
        match err {
            GcpError::Cloud(e) => e,
            GcpError::CommandFailed(msg) => CloudError::CommandFailed(msg),
            GcpError::Timeout(msg) => CloudError::Timeout(msg),
            GcpError::Api { .. } | GcpError::PreconditionFailed(_) | GcpError::Http(_) => {
                CloudError::ApiError(err.to_string())
            }
            GcpError::InvalidConfig(msg) => CloudError::InvalidConfig(msg),
            GcpError::Io(e) => CloudError::Io(e),
            GcpError::Json(e) => CloudError::Json(e),
            other => CloudError::CommandFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;
