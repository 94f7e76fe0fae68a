//! Cloud Storage access
//!
//! [`ObjectStorage`] is the seam the bucket manager and the asset
//! synchronizer talk to. [`GcsClient`] implements it on the Cloud Storage
//! JSON API with a bearer token.

use crate::error::{GcpError, Result};
use crate::gcloud::Gcloud;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const STORAGE_API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const STORAGE_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

/// IAM policy version that supports conditional bindings
const IAM_POLICY_VERSION: u32 = 3;

/// Settings for a newly created bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    pub name: String,
    pub project: String,
    /// Provider default location when unset
    pub location: Option<String>,
    pub uniform_access: bool,
}

/// Static website attributes of a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub main_page_suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found_page: Option<String>,
}

/// Bucket IAM policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
}

impl IamPolicy {
    /// Whether an unconditional binding grants `role` to `member`
    pub fn grants(&self, role: &str, member: &str) -> bool {
        self.bindings.iter().any(|b| {
            b.role == role && b.condition.is_none() && b.members.iter().any(|m| m == member)
        })
    }

    /// Add `member` to the unconditional binding for `role`
    pub fn add_member(&mut self, role: &str, member: &str) {
        match self
            .bindings
            .iter_mut()
            .find(|b| b.role == role && b.condition.is_none())
        {
            Some(binding) => binding.members.push(member.to_string()),
            None => self.bindings.push(Binding {
                role: role.to_string(),
                members: vec![member.to_string()],
                condition: None,
            }),
        }
    }
}

/// Bucket and object operations used by the bucket stage
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// `Ok(false)` when the bucket does not exist
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<()>;

    async fn set_website(&self, bucket: &str, website: &Website) -> Result<()>;

    async fn get_iam_policy(&self, bucket: &str) -> Result<IamPolicy>;

    /// Write a policy; fails with [`GcpError::PreconditionFailed`] when the
    /// policy's etag is stale
    async fn set_iam_policy(&self, bucket: &str, policy: &IamPolicy) -> Result<IamPolicy>;

    /// Names of every object in the bucket
    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>>;

    async fn write_object(&self, bucket: &str, name: &str, data: Vec<u8>) -> Result<()>;

    async fn set_content_type(&self, bucket: &str, name: &str, content_type: &str) -> Result<()>;

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}

/// Cloud Storage JSON API client
pub struct GcsClient {
    client: reqwest::Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl GcsClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base: STORAGE_API_BASE.to_string(),
            upload_base: STORAGE_UPLOAD_BASE.to_string(),
        }
    }

    /// Point the client at another endpoint (e.g. a storage emulator)
    pub fn with_endpoint(mut self, host: &str) -> Self {
        let host = host.trim_end_matches('/');
        self.api_base = format!("{}/storage/v1", host);
        self.upload_base = format!("{}/upload/storage/v1", host);
        self
    }

    /// Client authenticated from the environment
    ///
    /// Uses `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise asks gcloud
    /// for the active account's token. `STORAGE_EMULATOR_HOST` redirects
    /// every request to an emulator.
    pub async fn connect(gcloud: &Gcloud) -> Result<Self> {
        let token = match env_value("GOOGLE_OAUTH_ACCESS_TOKEN") {
            Some(token) => token,
            None => gcloud.access_token().await?,
        };
        Ok(Self::new(token).with_env_endpoint())
    }

    fn with_env_endpoint(self) -> Self {
        match env_value("STORAGE_EMULATOR_HOST") {
            Some(host) => {
                tracing::debug!("Using storage emulator at {}", host);
                self.with_endpoint(&host)
            }
            None => self,
        }
    }

    fn url(&self, base: &str, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(base)
            .map_err(|e| GcpError::InvalidConfig(format!("invalid endpoint {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| GcpError::InvalidConfig(format!("invalid endpoint {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn api(&self, segments: &[&str]) -> Result<reqwest::Url> {
        self.url(&self.api_base, segments)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.token).send().await?;
        check_status(response).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertBucketRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    iam_configuration: IamConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IamConfiguration {
    uniform_bucket_level_access: Enabled,
}

#[derive(Debug, Serialize)]
struct Enabled {
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct WebsitePatch<'a> {
    website: &'a Website,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentTypePatch<'a> {
    content_type: &'a str,
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a non-success response into [`GcpError::Api`] with the API's message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.trim().to_string()
            }
        });

    Err(GcpError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ObjectStorage for GcsClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let url = self.api(&["b", bucket])?;
        match self.send(self.client.get(url).query(&[("fields", "name")])).await {
            Ok(_) => Ok(true),
            Err(GcpError::Api { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<()> {
        let url = self.api(&["b"])?;
        let body = InsertBucketRequest {
            name: &spec.name,
            location: spec.location.as_deref(),
            iam_configuration: IamConfiguration {
                uniform_bucket_level_access: Enabled {
                    enabled: spec.uniform_access,
                },
            },
        };

        self.send(
            self.client
                .post(url)
                .query(&[("project", spec.project.as_str())])
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn set_website(&self, bucket: &str, website: &Website) -> Result<()> {
        let url = self.api(&["b", bucket])?;
        self.send(self.client.patch(url).json(&WebsitePatch { website }))
            .await?;
        Ok(())
    }

    async fn get_iam_policy(&self, bucket: &str) -> Result<IamPolicy> {
        let url = self.api(&["b", bucket, "iam"])?;
        let version = IAM_POLICY_VERSION.to_string();
        let response = self
            .send(
                self.client
                    .get(url)
                    .query(&[("optionsRequestedPolicyVersion", version.as_str())]),
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn set_iam_policy(&self, bucket: &str, policy: &IamPolicy) -> Result<IamPolicy> {
        let url = self.api(&["b", bucket, "iam"])?;
        let mut policy = policy.clone();
        policy.version = Some(IAM_POLICY_VERSION);

        match self.send(self.client.put(url).json(&policy)).await {
            Ok(response) => Ok(response.json().await?),
            Err(GcpError::Api {
                status: 409 | 412,
                message,
            }) => Err(GcpError::PreconditionFailed(message)),
            Err(e) => Err(e),
        }
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.api(&["b", bucket, "o"])?;
            let mut request = self.client.get(url).query(&[("fields", "items(name),nextPageToken")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ObjectList = self.send(request).await?.json().await?;
            names.extend(page.items.into_iter().map(|o| o.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn write_object(&self, bucket: &str, name: &str, data: Vec<u8>) -> Result<()> {
        let url = self.url(&self.upload_base, &["b", bucket, "o"])?;
        self.send(
            self.client
                .post(url)
                .query(&[("uploadType", "media"), ("name", name)])
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(data),
        )
        .await?;
        Ok(())
    }

    async fn set_content_type(&self, bucket: &str, name: &str, content_type: &str) -> Result<()> {
        let url = self.api(&["b", bucket, "o", name])?;
        self.send(
            self.client
                .patch(url)
                .json(&ContentTypePatch { content_type }),
        )
        .await?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        let url = self.api(&["b", bucket, "o", name])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let url = self.api(&["b", bucket])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}
