mod runner;
mod scheduler;
mod service;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use listwatch_core::AppConfig;
use listwatch_notify::{ChatNotifier, LogNotifier, Notifier};
use listwatch_scraper::{
    ConsistencyConfig, DelayRange, HttpRenderer, PatternExtractor, StabilityConfig,
};
use listwatch_store::{FileBlobStore, SnapshotStore, StatsStore};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::runner::CycleRunner;
use crate::scheduler::{AdaptiveScheduler, ScheduleConfig};
use crate::service::{LoopTimings, Service};

/// Pause between consecutive targets inside one cycle.
const INTER_TARGET_DELAY: DelayRange = DelayRange::new(5_000, 8_000);
const NOTIFY_TIMEOUT_SECS: u64 = 30;
const NOTIFY_BACKOFF_BASE_SECS: u64 = 1;

#[derive(Debug, Parser)]
#[command(name = "listwatch")]
#[command(about = "Watches listing pages and alerts when the newest item changes")]
struct Cli {
    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,
    /// Targets file; overrides LISTWATCH_TARGETS_PATH.
    #[arg(long, value_name = "PATH")]
    targets: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = listwatch_core::load_app_config()?;
    if let Some(path) = cli.targets {
        config.targets_path = path;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let targets = listwatch_core::load_targets(&config.targets_path)?.targets;
    tracing::info!(
        targets = targets.len(),
        path = %config.targets_path.display(),
        data_dir = %config.data_dir.display(),
        "listwatch starting"
    );

    let runner = build_runner(&config)?;
    let scheduler = AdaptiveScheduler::new(
        ScheduleConfig::from_app_config(&config),
        StatsStore::load(Box::new(FileBlobStore::new(config.stats_path()))),
    );
    let mut service = Service::new(
        runner,
        scheduler,
        targets,
        LoopTimings::from_app_config(&config),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    if cli.once {
        service.run_cycle(&shutdown_rx).await;
    } else {
        service.run(shutdown_rx).await;
    }

    tracing::info!("listwatch stopped");
    Ok(())
}

fn build_runner(config: &AppConfig) -> anyhow::Result<CycleRunner> {
    let extractor = PatternExtractor::new(config.item_pattern.as_deref())?;

    let notifier: Arc<dyn Notifier> = match &config.chat_token {
        Some(token) => Arc::new(ChatNotifier::new(
            &config.chat_api_base,
            token,
            NOTIFY_TIMEOUT_SECS,
            config.notify_max_retries,
            NOTIFY_BACKOFF_BASE_SECS,
        )?),
        None => {
            tracing::warn!("LISTWATCH_CHAT_TOKEN not set; alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let consistency = ConsistencyConfig {
        retries: config.consistency_retries,
        stability: StabilityConfig {
            max_attempts: config.stability_max_attempts,
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
            ..StabilityConfig::default()
        },
        ..ConsistencyConfig::default()
    };

    Ok(CycleRunner::new(
        Arc::new(HttpRenderer::new(
            config.navigation_timeout_secs,
            &config.user_agent,
        )),
        Arc::new(extractor),
        notifier,
        SnapshotStore::load(Box::new(FileBlobStore::new(config.snapshots_path()))),
        consistency,
        INTER_TARGET_DELAY,
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, finishing current step");
}
