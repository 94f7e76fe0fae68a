use crate::utils::{self, RunOptions, Site};
use colored::Colorize;
use siteflow_cloud::Deployment;
use siteflow_cloud_gcp::{BucketStage, GcsClient};

pub async fn handle(site: &Site, options: RunOptions) -> anyhow::Result<()> {
    let lock = site.store.acquire_lock().await?;
    let result = run(site, options).await;
    lock.release().await?;
    result.map(|_| ())
}

/// Bucket stage; shared with `up`
pub async fn run(site: &Site, options: RunOptions) -> anyhow::Result<Deployment> {
    println!("{}", "Deploying Cloud Storage assets...".blue().bold());
    utils::print_config_file(site);

    let deploy = &site.config.deploy;
    deploy.validate()?;

    let gcloud = options.gcloud(&deploy.project);
    let storage = GcsClient::connect(&gcloud).await?;
    let outcome = BucketStage::new(&storage).deploy(deploy).await?;

    if outcome.bucket.created {
        println!("  {} Bucket {} created", "✓".green(), deploy.bucket.cyan());
    } else {
        println!("  {} Found existing bucket {}", "✓".green(), deploy.bucket.cyan());
    }
    println!("  {} Website hosting configured", "✓".green());
    println!("  {} Objects are publicly readable", "✓".green());

    let sync = &outcome.sync;
    println!(
        "  {} Uploaded {} files from {}",
        "✓".green(),
        sync.uploaded.len(),
        deploy.directory.display()
    );
    if !sync.is_clean() {
        println!(
            "  {}",
            format!("⚠ {} files failed to upload:", sync.errors.len()).yellow()
        );
        for error in &sync.errors {
            println!("    - {}", error);
        }
    }

    site.store.save_deployment(&outcome.deployment).await?;
    println!();
    println!("{}", "✓ Deploy complete".green().bold());

    Ok(outcome.deployment)
}
