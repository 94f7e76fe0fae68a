use colored::Colorize;
use siteflow_cloud::{
    ActionType, ApplyResult, Deployment, ExistenceMode, Plan, RecordStore, StepOutcome,
};
use siteflow_cloud_gcp::Gcloud;
use siteflow_config::SiteConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options shared by every command that talks to the provider
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub strict_exists: bool,
    pub timeout_secs: Option<u64>,
}

impl RunOptions {
    pub fn existence_mode(&self) -> ExistenceMode {
        if self.strict_exists {
            ExistenceMode::Strict
        } else {
            ExistenceMode::Lenient
        }
    }

    pub fn gcloud(&self, project: &str) -> Gcloud {
        let gcloud = Gcloud::new(project);
        match self.timeout_secs {
            Some(secs) => gcloud.with_timeout(Duration::from_secs(secs)),
            None => gcloud,
        }
    }
}

/// Loaded configuration plus where its records live
pub struct Site {
    pub config: SiteConfig,
    pub root: PathBuf,
    pub store: RecordStore,
}

impl Site {
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = siteflow_config::load_site_config(config_path)?;
        let root = match &config.source {
            Some(source) => project_root(source)?,
            None => std::env::current_dir()?,
        };
        let store = RecordStore::new(&root);
        tracing::debug!("Records are kept under {}", store.state_dir().display());
        Ok(Self {
            config,
            root,
            store,
        })
    }

    /// Deployment from the record store, else from the configuration
    pub async fn deployment(&self) -> anyhow::Result<Deployment> {
        if let Some(deployment) = self.store.load_deployment().await? {
            return Ok(deployment);
        }
        let deploy = &self.config.deploy;
        Ok(Deployment::new(
            deploy.bucket.clone(),
            deploy.project.clone(),
            deploy.region.clone(),
        ))
    }
}

/// Records are kept next to the config file, or next to `.siteflow/`
/// when the config lives inside it. The global config uses the current
/// directory.
fn project_root(config_file: &Path) -> anyhow::Result<PathBuf> {
    let global = siteflow_config::get_config_dir().ok();
    let dir = config_file.parent().unwrap_or_else(|| Path::new("."));

    if global.as_deref() == Some(dir) {
        return Ok(std::env::current_dir()?);
    }
    if dir.file_name().is_some_and(|name| name == ".siteflow") {
        return Ok(dir.parent().unwrap_or(dir).to_path_buf());
    }
    if dir.as_os_str().is_empty() {
        return Ok(std::env::current_dir()?);
    }
    Ok(dir.to_path_buf())
}

pub fn print_config_file(site: &Site) {
    if let Some(source) = &site.config.source {
        println!("📄 Config: {}", source.display().to_string().cyan());
    }
}

pub fn print_apply(result: &ApplyResult) {
    for step in &result.steps {
        let marker = match step.outcome {
            StepOutcome::Created | StepOutcome::Destroyed => "✓".green(),
            StepOutcome::FoundExisting | StepOutcome::AlreadyAbsent => "•".dimmed(),
        };
        println!(
            "  {} {} {} ({})",
            marker,
            step.kind,
            step.name.cyan(),
            step.outcome
        );
    }
    println!("  {}", format!("({} ms)", result.duration_ms).dimmed());
}

pub fn print_plan(plan: &Plan) {
    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => "=".dimmed(),
        };
        println!("  {} {}", marker, action.description);
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}
