//! gcloud CLI wrapper
//!
//! Wraps the `gcloud compute` commands used for the CDN chain.

use crate::error::{GcpError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// stderr fragments that mean the resource definitely does not exist
const NOT_FOUND_MARKERS: [&str; 3] = ["was not found", "notFound", "404"];

/// gcloud CLI wrapper bound to a project
#[derive(Debug, Clone)]
pub struct Gcloud {
    project: String,
    timeout: Option<Duration>,
}

impl Gcloud {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            timeout: None,
        }
    }

    /// Abort any single command that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Check that gcloud is installed and has an active account
    pub async fn check_auth(&self) -> Result<String> {
        let account = self
            .exec(&[
                "auth",
                "list",
                "--filter=status:ACTIVE",
                "--format=value(account)",
            ])
            .await?;

        match account.lines().next() {
            Some(account) if !account.is_empty() => Ok(account.to_string()),
            _ => Err(GcpError::AuthenticationFailed(
                "no active account, run `gcloud auth login`".to_string(),
            )),
        }
    }

    /// OAuth access token of the active account
    pub async fn access_token(&self) -> Result<String> {
        let token = self.exec(&["auth", "print-access-token"]).await?;
        if token.is_empty() {
            return Err(GcpError::AuthenticationFailed(
                "gcloud returned an empty access token".to_string(),
            ));
        }
        Ok(token)
    }

    /// Run a gcloud command and return trimmed stdout
    async fn exec(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("gcloud");
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!("Running: gcloud {}", args.join(" "));

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| GcpError::Timeout(args.join(" ")))?,
            None => cmd.output().await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GcpError::GcloudNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GcpError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a `gcloud compute` command against the bound project
    async fn compute(&self, args: &[String]) -> Result<String> {
        let project = format!("--project={}", self.project);
        let mut full: Vec<&str> = vec!["compute"];
        full.extend(args.iter().map(String::as_str));
        full.push(&project);
        self.exec(&full).await
    }

    /// Describe a resource
    ///
    /// `Ok(false)` only when gcloud reports the resource as not found.
    pub async fn describe(&self, collection: &str, name: &str, global: bool) -> Result<bool> {
        let args = scoped(&[collection, "describe", name, "--format=value(name)"], global);

        match self.compute(&args).await {
            Ok(_) => Ok(true),
            Err(GcpError::CommandFailed(msg)) if is_not_found(&msg) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a resource with collection-specific arguments
    pub async fn create(
        &self,
        collection: &str,
        name: &str,
        global: bool,
        extra: &[String],
    ) -> Result<()> {
        let mut args = scoped(&[collection, "create", name], global);
        args.extend(extra.iter().cloned());
        self.compute(&args).await?;
        Ok(())
    }

    /// Delete a resource without prompting
    pub async fn delete(&self, collection: &str, name: &str, global: bool) -> Result<()> {
        let args = scoped(&[collection, "delete", name, "--quiet"], global);
        self.compute(&args).await?;
        Ok(())
    }

    /// Reserved address of a global IP resource
    pub async fn address(&self, name: &str) -> Result<String> {
        let args = scoped(&["addresses", "describe", name, "--format=get(address)"], true);
        self.compute(&args).await
    }
}

fn scoped(args: &[&str], global: bool) -> Vec<String> {
    let mut args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    if global {
        args.push("--global".to_string());
    }
    args
}

fn is_not_found(stderr: &str) -> bool {
    NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m))
}
