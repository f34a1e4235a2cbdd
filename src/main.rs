use std::sync::Arc;

use anyhow::Context;

use station_bot::config::{BotConfig, StoreBackend};
use station_bot::features::{FeatureRegistry, OnboardingFeature};
use station_bot::gateway::{self, CliGateway, Gateway};
use station_bot::onboarding::OnboardingCoordinator;
use station_bot::routing::EventRouter;
use station_bot::store;
use station_bot::workers::WorkerStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("invalid configuration")?;

    eprintln!("🚉 Station Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Namespace: {}", config.namespace);
    eprintln!(
        "   Workers: {}",
        config
            .workers
            .iter()
            .map(|w| w.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // ── Store ────────────────────────────────────────────────────────────
    let store = store::connect(&config)
        .await
        .context("failed to open the shared store")?;

    // ── Onboarding ───────────────────────────────────────────────────────
    let coordinator = Arc::new(OnboardingCoordinator::from_config(store, &config));

    // No worker processes run alongside the in-memory store; stand in for them.
    if config.store == StoreBackend::Memory {
        for worker in coordinator.roster() {
            coordinator
                .statuses()
                .set(worker, WorkerStatus::Available)
                .await?;
        }
        eprintln!("   Store: memory (roster marked available)");
    } else {
        eprintln!("   Store: redis");
    }

    // ── Features ─────────────────────────────────────────────────────────
    let router = Arc::new(EventRouter::new());
    let mut registry = FeatureRegistry::new(Arc::clone(&router));
    registry.register(Arc::new(OnboardingFeature::new(Arc::clone(&coordinator))))?;
    eprintln!("   Features: {}", registry.names().join(", "));
    let registry = Arc::new(registry);

    // ── Gateway ──────────────────────────────────────────────────────────
    let cli = CliGateway::new();
    eprintln!("   Gateway: {} (one JSON event per line)\n", cli.name());
    let events = cli.start().await?;

    let pumped = gateway::pump(events, registry).await;
    tracing::info!(events = pumped, "Gateway closed");

    Ok(())
}
