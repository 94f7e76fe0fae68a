use crate::utils::{self, RunOptions, Site};
use colored::Colorize;
use siteflow_cloud::Deployment;
use siteflow_cloud_gcp::{CdnStage, GcloudBackend};

pub async fn handle(site: &Site, options: RunOptions) -> anyhow::Result<()> {
    let lock = site.store.acquire_lock().await?;
    let result = async {
        let deployment = site.store.load_deployment().await?.ok_or_else(|| {
            anyhow::anyhow!("No deployment record found. Run `site deploy` first")
        })?;
        run(site, options, &deployment).await
    }
    .await;
    lock.release().await?;
    result
}

/// CDN stage; shared with `up`
pub async fn run(site: &Site, options: RunOptions, deployment: &Deployment) -> anyhow::Result<()> {
    println!("{}", "Releasing to Cloud CDN...".blue().bold());
    utils::print_config_file(site);

    let backend = GcloudBackend::new(options.gcloud(deployment.project()));
    let outcome = CdnStage::new(&backend)
        .with_mode(options.existence_mode())
        .release(deployment, &site.config.release)
        .await?;

    utils::print_apply(&outcome.apply);
    site.store.save_release(&outcome.release).await?;

    println!();
    println!("{}", "✓ Release complete".green().bold());
    println!("  URL: {}", outcome.release.url().cyan());
    match outcome.release.address() {
        Some(address) => println!(
            "  Point the DNS A record for {} at {}",
            outcome.release.url().trim_start_matches("https://"),
            address.cyan()
        ),
        None => println!(
            "  {}",
            "Could not read back the reserved IP address".yellow()
        ),
    }
    println!(
        "  {}",
        "The managed certificate is issued once DNS resolves to the load balancer".dimmed()
    );

    Ok(())
}
