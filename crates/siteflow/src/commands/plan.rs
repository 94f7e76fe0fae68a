use crate::utils::{self, RunOptions, Site};
use colored::Colorize;
use siteflow_cloud::Release;
use siteflow_cloud_gcp::{CdnStage, GcloudBackend};

pub async fn handle(site: &Site, options: RunOptions, destroy: bool) -> anyhow::Result<()> {
    utils::print_config_file(site);
    let deployment = site.deployment().await?;

    let backend = GcloudBackend::new(options.gcloud(deployment.project()));
    let stage = CdnStage::new(&backend).with_mode(options.existence_mode());

    let plan = if destroy {
        println!("{}", "Planning teardown of the CDN chain...".blue().bold());
        let release = match site.store.load_release().await? {
            Some(release) => release,
            None => Release::for_teardown(&deployment),
        };
        stage.teardown_plan(&release).await?
    } else {
        println!("{}", "Planning release of the CDN chain...".blue().bold());
        stage.plan(&deployment).await?
    };

    println!();
    utils::print_plan(&plan);
    Ok(())
}
