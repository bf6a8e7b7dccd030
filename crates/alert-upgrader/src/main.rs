use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use alert_upgrader::{
    config::Config,
    metrics,
    settings::{KubeSettings, Settings, StaticSettings, SYSTEM_MONITORING_CATALOG_ID},
    store::Stores,
    upgrade::{AlertingUpgrader, ServiceUpgrader},
};

#[derive(Parser)]
#[command(name = "alert-upgrader", version, about = "Upgrade a cluster's alerting service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one upgrade pass and print the version now deployed
    Upgrade {
        /// Version recorded by the last successful upgrade
        #[arg(long, default_value = "")]
        previous_version: String,
    },
    /// Print the version the service should be at
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    let client = kube::Client::try_default()
        .await
        .context("failed to create kubernetes client")?;

    let settings: Arc<dyn Settings> = match &config.catalog_id_override {
        Some(id) => Arc::new(StaticSettings::new().with(SYSTEM_MONITORING_CATALOG_ID, id)),
        None => Arc::new(KubeSettings::new(client.clone())),
    };
    let upgrader = AlertingUpgrader::new(&config, settings, Stores::kube(client));

    match cli.command {
        Command::Upgrade { previous_version } => {
            let version = upgrader
                .upgrade(&previous_version)
                .await
                .with_context(|| format!("{} upgrade failed", upgrader.name()))?;
            println!("{}", version);
        }
        Command::Version => {
            println!("{}", upgrader.version().await?);
        }
    }

    debug!("Metrics:\n{}", metrics::gather_metrics());
    Ok(())
}
