use colored::Colorize;
use siteflow_cloud::{ResourceGraph, ResourceKind};
use std::path::Path;

pub fn handle(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating site config...".blue());

    let config = siteflow_config::load_site_config(config_path)?;
    if let Some(source) = &config.source {
        println!("Config file: {}", source.display().to_string().cyan());
    }
    config.validate()?;

    let deploy = &config.deploy;
    println!("{}", "✓ Site config is valid".green().bold());
    println!();
    println!("Deploy:");
    println!("  bucket:    {}", deploy.bucket.cyan());
    println!("  project:   {}", deploy.project);
    println!(
        "  region:    {}",
        deploy.region.as_deref().unwrap_or("(provider default)")
    );
    println!("  directory: {}", deploy.directory.display());
    println!("  index:     {}", deploy.index_page);
    println!(
        "  not-found: {}",
        deploy.not_found_page.as_deref().unwrap_or("(none)")
    );

    println!("Release:");
    match config.release.url() {
        Ok(url) => {
            println!("  url:       {}", url.cyan());
            println!("  domains:   {}", config.release.domains.join(", "));
        }
        Err(_) => println!("  {}", "(no domain configured; `site release` is unavailable)".yellow()),
    }

    if let Err(e) = ResourceGraph::new(deploy.bucket.as_str()).and_then(|g| g.verify_names()) {
        println!("  {}", format!("⚠ {}; `site release` is unavailable", e).yellow());
    }

    println!("Resources:");
    for kind in ResourceKind::PROVISION_ORDER {
        println!("  {:<16} {}", kind.label(), kind.resource_name(&deploy.bucket));
    }

    Ok(())
}
