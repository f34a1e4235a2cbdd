//! Gateway abstraction: where platform events come from.

pub mod cli;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::task::JoinSet;
use tracing::{error, warn};

pub use cli::CliGateway;

use crate::error::GatewayError;
use crate::events::GatewayEvent;
use crate::features::FeatureRegistry;

/// Stream of events produced by a started gateway.
pub type EventStream = Pin<Box<dyn Stream<Item = GatewayEvent> + Send>>;

/// A source of platform events.
#[async_trait]
pub trait Gateway: Send + Sync {
    fn name(&self) -> &str;

    /// Start delivering events. The stream ends when the source closes.
    async fn start(&self) -> Result<EventStream, GatewayError>;
}

/// Dispatch every event from `stream`, one task per event.
///
/// Returns once the stream has ended and every in-flight dispatch finished.
/// The result is the number of events pumped.
pub async fn pump(mut stream: EventStream, registry: Arc<FeatureRegistry>) -> usize {
    let mut in_flight = JoinSet::new();
    let mut pumped = 0;

    while let Some(event) = stream.next().await {
        pumped += 1;
        let registry = Arc::clone(&registry);
        in_flight.spawn(async move {
            if let Err(e) = registry.dispatch(&event).await {
                warn!(
                    event = event.kind(),
                    guild = %event.guild_id(),
                    error = %e,
                    "Dispatch failed"
                );
            }
        });
        while let Some(done) = in_flight.try_join_next() {
            log_join(done);
        }
    }

    while let Some(done) = in_flight.join_next().await {
        log_join(done);
    }
    pumped
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("Dispatch task died: {}", e);
    }
}
