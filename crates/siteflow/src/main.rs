mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use utils::{RunOptions, Site};

#[derive(Parser)]
#[command(name = "site")]
#[command(about = "Static sites on Cloud Storage, served through Cloud CDN", long_about = None)]
struct Cli {
    /// Path to site.kdl (discovered when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show lifecycle logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Abort any single gcloud command after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate site.kdl
    Validate,
    /// Create the bucket and upload the site
    Deploy,
    /// Put the HTTPS load balancer and CDN in front of the bucket
    Release {
        /// Fail on lookup errors instead of treating them as "absent"
        #[arg(long)]
        strict_exists: bool,
    },
    /// Deploy, then release
    Up {
        /// Fail on lookup errors instead of treating them as "absent"
        #[arg(long)]
        strict_exists: bool,
    },
    /// Show what release (or destroy) would change
    Plan {
        /// Plan a teardown instead
        #[arg(long)]
        destroy: bool,
        /// Fail on lookup errors instead of treating them as "absent"
        #[arg(long)]
        strict_exists: bool,
    },
    /// Tear down the CDN chain, then the bucket
    Destroy {
        /// Leave the bucket and its objects in place
        #[arg(long)]
        keep_bucket: bool,
        /// Fail on lookup errors instead of treating them as "absent"
        #[arg(long)]
        strict_exists: bool,
        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "siteflow {} (config: {:?}, timeout: {:?})",
        env!("CARGO_PKG_VERSION"),
        cli.config,
        cli.timeout
    );

    let options = |strict_exists: bool| RunOptions {
        strict_exists,
        timeout_secs: cli.timeout,
    };

    match cli.command {
        Commands::Version => {
            println!("siteflow {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate => {
            commands::validate::handle(cli.config.as_deref())?;
        }
        Commands::Deploy => {
            let site = Site::load(cli.config.as_deref())?;
            commands::deploy::handle(&site, options(false)).await?;
        }
        Commands::Release { strict_exists } => {
            let site = Site::load(cli.config.as_deref())?;
            commands::release::handle(&site, options(strict_exists)).await?;
        }
        Commands::Up { strict_exists } => {
            let site = Site::load(cli.config.as_deref())?;
            commands::up::handle(&site, options(strict_exists)).await?;
        }
        Commands::Plan {
            destroy,
            strict_exists,
        } => {
            let site = Site::load(cli.config.as_deref())?;
            commands::plan::handle(&site, options(strict_exists), destroy).await?;
        }
        Commands::Destroy {
            keep_bucket,
            strict_exists,
            yes,
        } => {
            let site = Site::load(cli.config.as_deref())?;
            commands::destroy::handle(&site, options(strict_exists), keep_bucket, yes).await?;
        }
    }

    Ok(())
}
