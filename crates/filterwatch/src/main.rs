//! filterwatch binary.

use clap::Parser;
use filterwatch::{Cli, Launcher, ObservabilityConfig, describe_plan, init_observability};
use filterwatch_config::ConfigStore;
use filterwatch_error::FilterwatchResult;
use filterwatch_mediawiki::MediaWikiConnector;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_observability(
        &ObservabilityConfig::default()
            .with_log_level(cli.log_level.as_str())
            .with_json_logs(cli.json_logs),
    )?;

    run(cli).await?;
    Ok(())
}

async fn run(cli: Cli) -> FilterwatchResult<()> {
    info!(config = %cli.config.display(), "Loading configuration");
    let store = Arc::new(ConfigStore::open(&cli.config)?);

    if cli.check {
        let plan = store.current().startup_plan()?;
        for line in describe_plan(&plan) {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut launcher = Launcher::new(store, Arc::new(MediaWikiConnector::new()));
    let started = launcher.launch()?;
    if started == 0 {
        error!("No instance to start, check the configuration");
        return Ok(());
    }
    info!(instances = started, "Relay running, press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C, shutting down");
    }
    info!("Shutting down");
    launcher.shutdown().await;
    Ok(())
}
