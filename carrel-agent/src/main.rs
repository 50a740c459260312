use anyhow::Context;
use carrel_core::SystemClock;
use carrel_store::Config;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carrel_agent=debug,carrel_seating=info,carrel_store=info".into()),
        )
        // stdout carries command replies
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting Carrel agent: freeze window {} min, sweep every {}s, {:?} storage",
        config.rules.freeze_minutes,
        config.rules.sweep_interval_seconds,
        config.storage.backend
    );

    let store = carrel_agent::session::open_store(&config.storage).await?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            on_signal.cancel();
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    carrel_agent::session::run(
        &config,
        store,
        Arc::new(SystemClock),
        stdin,
        tokio::io::stdout(),
        shutdown,
    )
    .await
}
