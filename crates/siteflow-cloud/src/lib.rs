//! SiteFlow Cloud
//!
//! Provider-neutral core of the static-site CDN chain: the six networking
//! resources that front an origin bucket with a global HTTPS load balancer,
//! the order they must be created in, and the idempotent walks that create
//! and destroy them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 siteflow CLI                      │
//! │          (site deploy / release / destroy)        │
//! └─────────────────┬────────────────────────────────┘
//!                   │ Deployment / Release records
//! ┌─────────────────▼────────────────────────────────┐
//! │                siteflow-cloud                     │
//! │  ResourceGraph ─► Provisioner / Decommissioner    │
//! │                     │                             │
//! │            trait ResourceBackend                  │
//! └─────────────────────┬────────────────────────────┘
//!                       │
//! ┌─────────────────────▼────────────────────────────┐
//! │              siteflow-cloud-gcp                   │
//! │    gcloud compute  ·  Cloud Storage JSON API      │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Resource chain
//!
//! | order | kind | name |
//! |---|---|---|
//! | 1 | IP address | `{bucket}-ip` |
//! | 2 | backend bucket | `{bucket}-backend-bucket` |
//! | 3 | URL map | `{bucket}-lb` |
//! | 4 | SSL certificate | `{bucket}-cert` |
//! | 5 | HTTPS proxy | `{bucket}-lb-proxy` |
//! | 6 | forwarding rule | `{bucket}-lb-forwarding-rule` |

pub mod action;
pub mod backend;
pub mod decommissioner;
pub mod error;
pub mod graph;
pub mod provisioner;
pub mod record;
pub mod resource;
pub mod state;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary, StepOutcome, StepResult};
pub use backend::{ExistenceMode, ResourceBackend, ResourceHandle};
pub use decommissioner::Decommissioner;
pub use error::{CloudError, Result};
pub use graph::{HTTPS_PORT, ResourceGraph};
pub use provisioner::Provisioner;
pub use record::{Deployment, Release};
pub use resource::{
    CreateParams, MAX_RESOURCE_NAME_LEN, ResourceKind, ResourceNode, validate_resource_name,
};
pub use state::{RecordStore, StateLock};
