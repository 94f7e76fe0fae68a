//! Google Cloud provider for SiteFlow
//!
//! Serves a static site from a Cloud Storage bucket behind a global HTTPS
//! load balancer with Cloud CDN.
//!
//! # Stages
//!
//! - [`BucketStage`]: creates the origin bucket, configures website hosting
//!   and public read access, uploads the site. Produces a
//!   [`siteflow_cloud::Deployment`].
//! - [`CdnStage`]: provisions the six networking resources in front of the
//!   bucket. Produces a [`siteflow_cloud::Release`].
//!
//! # Requirements
//!
//! - `gcloud` CLI must be installed and authenticated
//! - Cloud Storage calls use `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise
//!   `gcloud auth print-access-token`
//!
//! # Example
//!
//! ```ignore
//! use siteflow_cloud_gcp::{BucketStage, CdnStage, Gcloud, GcloudBackend, GcsClient};
//!
//! let gcloud = Gcloud::new("my-project");
//! let storage = GcsClient::connect(&gcloud).await?;
//! let outcome = BucketStage::new(&storage).deploy(&config.deploy).await?;
//!
//! let backend = GcloudBackend::new(gcloud);
//! let released = CdnStage::new(&backend)
//!     .release(&outcome.deployment, &config.release)
//!     .await?;
//! println!("{}", released.release.url());
//! ```

pub mod bucket;
pub mod compute;
pub mod content_type;
pub mod error;
pub mod gcloud;
pub mod platform;
pub mod release;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod testing;

pub use bucket::{BucketManager, BucketStatus, BucketTeardown};
pub use compute::GcloudBackend;
pub use error::{GcpError, Result};
pub use gcloud::Gcloud;
pub use platform::{BucketStage, DeployOutcome};
pub use release::{CdnStage, ReleaseOutcome};
pub use storage::{GcsClient, IamPolicy, ObjectStorage};
pub use sync::{AssetSync, SyncError, SyncReport};
