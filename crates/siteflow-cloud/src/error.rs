//! Cloud orchestration error types

use crate::resource::ResourceKind;
use thiserror::Error;

/// Errors raised while orchestrating the CDN resource chain
#[derive(Error, Debug)]
pub enum CloudError {
    /// Bad or missing configuration, raised before any external call
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A provider call failed; the message is the provider's, verbatim
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    /// A lifecycle step failed for a named resource
    #[error("failed to {action} {kind} {name}: {source}")]
    ResourceFailed {
        kind: ResourceKind,
        name: String,
        action: &'static str,
        #[source]
        source: Box<CloudError>,
    },

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub(crate) fn resource(
        kind: ResourceKind,
        name: impl Into<String>,
        action: &'static str,
        source: CloudError,
    ) -> Self {
        CloudError::ResourceFailed {
            kind,
            name: name.into(),
            action,
            source: Box::new(source),
        }
    }

    /// The resource kind a lifecycle failure is attributed to, if any
    pub fn failed_kind(&self) -> Option<ResourceKind> {
        match self {
            CloudError::ResourceFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
