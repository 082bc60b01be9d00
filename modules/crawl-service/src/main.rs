use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crawl_common::{Config, CounterPort, NoopCounter};
use crawl_core::adapters::{InMemoryGraphStore, InMemoryIndexStore, ReqwestUrlGetter};
use crawl_core::ports::FixedPartition;
use crawl_core::privnet::DefaultPrivateNetworkDetector;
use crawl_core::{Crawler, CrawlScheduler};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("crawl-service starting");

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }
    config.log_redacted();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "crawl-service exiting with error");
            ExitCode::FAILURE
        }
    }
}

/// Wires the real adapters and runs the scheduler until a shutdown signal or
/// a crawl failure ends it (§11.4, §4.9).
async fn run(config: Config) -> Result<()> {
    // The graph and text-index stores are external ports (§6) with no
    // concrete backend named by the contract; `config.dsn` is reserved for a
    // real deployment to wire a persistent store through. Absent one, this
    // binary runs against single-process, non-persistent defaults.
    let graph = Arc::new(InMemoryGraphStore::new());
    let index = Arc::new(InMemoryIndexStore::new());
    let partition_detector = Arc::new(FixedPartition);
    let counter: Arc<dyn CounterPort> = Arc::new(NoopCounter);

    let getter = Arc::new(ReqwestUrlGetter::new(std::time::Duration::from_secs(30))?);
    let detector = Arc::new(DefaultPrivateNetworkDetector);

    let crawler = Crawler::new(
        getter,
        detector,
        graph.clone(),
        index.clone(),
        config.crawler_worker,
    )?;

    let scheduler = CrawlScheduler::new(
        config.crawler_wake_interval,
        config.crawler_reindex_threshold,
        partition_detector,
        graph,
        crawler,
        counter,
    );

    let token = CancellationToken::new();
    let shutdown_token = token.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received, cancelling in-flight work");
        shutdown_token.cancel();
    });

    scheduler.run(token).await?;

    tracing::info!("crawl-service stopped cleanly");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sighup.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
