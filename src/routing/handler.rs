//! Handler abstraction for indexed routing.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FeatureError;

/// Something that reacts to one kind of routed event.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, event: &E) -> Result<(), FeatureError>;
}

/// Shared handle stored in the router's index.
pub type Handler<E> = Arc<dyn EventHandler<E>>;

/// Adapter turning an async closure into an [`EventHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<E, F, Fut> EventHandler<E> for FnHandler<F>
where
    E: Clone + Send + Sync + 'static,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), FeatureError>> + Send + 'static,
{
    async fn handle(&self, event: &E) -> Result<(), FeatureError> {
        (self.0)(event.clone()).await
    }
}

/// Wrap an async closure as a routable handler.
///
/// ```ignore
/// router
///     .on_voice_leave(guild, station, handler_fn(|event: VoiceStateEvent| async move {
///         tracing::info!(user = %event.user_id, "left the station");
///         Ok(())
///     }))
///     .await;
/// ```
pub fn handler_fn<E, F, Fut>(f: F) -> Handler<E>
where
    E: Clone + Send + Sync + 'static,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), FeatureError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
