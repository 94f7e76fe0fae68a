use crate::utils::{self, RunOptions, Site};
use colored::Colorize;
use siteflow_cloud::Release;
use siteflow_cloud_gcp::{BucketStage, CdnStage, GcloudBackend, GcsClient};

pub async fn handle(
    site: &Site,
    options: RunOptions,
    keep_bucket: bool,
    yes: bool,
) -> anyhow::Result<()> {
    utils::print_config_file(site);
    let deployment = site.deployment().await?;
    let release = match site.store.load_release().await? {
        Some(release) => release,
        None => Release::for_teardown(&deployment),
    };

    if !yes {
        println!();
        println!(
            "{}",
            format!(
                "Warning: this deletes the CDN chain for {}{}.",
                release.bucket(),
                if keep_bucket { "" } else { " and the bucket with all its objects" }
            )
            .yellow()
        );
        println!("Pass --yes to continue");
        return Ok(());
    }

    let lock = site.store.acquire_lock().await?;
    let result = async {
        println!("{}", "Destroying Cloud CDN resources...".blue().bold());
        let backend = GcloudBackend::new(options.gcloud(release.project()));
        let apply = CdnStage::new(&backend)
            .with_mode(options.existence_mode())
            .destroy(&release)
            .await?;
        utils::print_apply(&apply);
        site.store.clear_release().await?;

        if keep_bucket {
            println!("  {} Keeping bucket {}", "•".dimmed(), deployment.bucket().cyan());
            return Ok(());
        }

        println!();
        println!("{}", "Destroying Cloud Storage assets...".blue().bold());
        let gcloud = options.gcloud(deployment.project());
        let storage = GcsClient::connect(&gcloud).await?;
        let teardown = BucketStage::new(&storage).destroy(&deployment).await?;
        if teardown.existed {
            println!(
                "  {} Deleted {} objects and bucket {}",
                "✓".green(),
                teardown.objects_deleted,
                deployment.bucket().cyan()
            );
        } else {
            println!("  {} Bucket {} does not exist", "•".dimmed(), deployment.bucket().cyan());
        }
        site.store.clear_deployment().await?;
        anyhow::Ok(())
    }
    .await;
    lock.release().await?;

    result?;
    println!();
    println!("{}", "✓ Destroy complete".green().bold());
    Ok(())
}
