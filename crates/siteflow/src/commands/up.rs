use crate::commands::{deploy, release};
use crate::utils::{RunOptions, Site};
use siteflow_cloud::ResourceGraph;

pub async fn handle(site: &Site, options: RunOptions) -> anyhow::Result<()> {
    // Both stages need their config before anything is created
    site.config.validate()?;
    site.config.release.primary_domain()?;
    ResourceGraph::new(site.config.deploy.bucket.as_str())?.verify_names()?;

    let lock = site.store.acquire_lock().await?;
    let result = async {
        let deployment = deploy::run(site, options).await?;
        println!();
        release::run(site, options, &deployment).await
    }
    .await;
    lock.release().await?;
    result
}
