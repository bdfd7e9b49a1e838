mod cli;
mod config;
mod error;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use wanwatch_api::TransportConfig;
use wanwatch_core::{HubConfig, Notifier, Poller, ProviderChecker, StatusStore};

use crate::cli::Cli;
use crate::error::DaemonError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), DaemonError> {
    let monitor = config::load(&cli.config)?;
    monitor.validate().map_err(|e| DaemonError::Config {
        message: e.to_string(),
    })?;

    let webhook_url = monitor
        .webhook_url
        .as_deref()
        .map(str::parse::<url::Url>)
        .transpose()
        .map_err(|e| DaemonError::Config {
            message: format!("invalid webhook_url: {e}"),
        })?;

    let hub = HubConfig::resolve(&monitor.providers);
    if hub.is_none() {
        tracing::info!("no hub controller configured, gateway enrichment disabled");
    }

    let transport = TransportConfig::default();
    let checker = ProviderChecker::new(hub).map_err(|e| DaemonError::Config {
        message: e.to_string(),
    })?;
    let store = Arc::new(StatusStore::new(
        monitor.providers.iter().map(|p| p.name.clone()),
    ));
    let notifier = Arc::new(Notifier::new(webhook_url, &transport).map_err(|e| {
        DaemonError::Config {
            message: e.to_string(),
        }
    })?);

    let cancel = CancellationToken::new();
    let poller = Poller::new(
        monitor.providers,
        Duration::from_secs(monitor.check_interval_seconds),
        checker,
        Arc::clone(&store),
        notifier,
        cancel.clone(),
    );

    let handle = tokio::spawn(async move { poller.run().await });

    tokio::signal::ctrl_c().await.map_err(DaemonError::Io)?;
    tracing::info!("shutdown requested");
    cancel.cancel();
    let _ = handle.await;

    // Final snapshot on the way out, for the operator's scrollback.
    for (name, status) in store.public_view() {
        tracing::info!(provider = %name, up = status.up, "final status");
    }
    Ok(())
}
