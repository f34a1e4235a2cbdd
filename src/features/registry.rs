//! Feature registry: fallback dispatch for low-frequency events.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{FeatureError, RegistryError};
use crate::events::{
    GatewayEvent, InteractionEvent, MemberEvent, MessageDeleteEvent, MessageEvent, ReactionEvent,
    VoiceStateEvent,
};
use crate::routing::EventRouter;

use super::feature::{Dispatch, EventKind, Feature};

/// Registry of bot features.
///
/// Populated at startup through `&mut self`, then shared behind an `Arc`.
/// Dispatch never locks.
pub struct FeatureRegistry {
    features: HashMap<String, Arc<dyn Feature>>,
    router: Arc<EventRouter>,
}

impl FeatureRegistry {
    pub fn new(router: Arc<EventRouter>) -> Self {
        Self {
            features: HashMap::new(),
            router,
        }
    }

    /// Register a feature. Names are unique; a rejected registration leaves
    /// the existing one in place.
    pub fn register(&mut self, feature: Arc<dyn Feature>) -> Result<(), RegistryError> {
        let name = feature.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.features.contains_key(&name) {
            warn!(feature = %name, "Rejected feature registration: name already taken");
            return Err(RegistryError::Duplicate { name });
        }
        self.features.insert(name.clone(), feature);
        debug!("Registered feature: {}", name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Feature>> {
        self.features.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.features.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Offer an interaction to each feature until one claims it.
    /// Returns the claiming feature's name.
    pub async fn dispatch_interaction(
        &self,
        event: &InteractionEvent,
    ) -> Result<Option<String>, FeatureError> {
        self.scan("interaction", None, move |feature| {
            feature.handle_interaction(event)
        })
        .await
    }

    pub async fn dispatch_reaction_add(
        &self,
        event: &ReactionEvent,
    ) -> Result<Option<String>, FeatureError> {
        self.scan("reaction_add", Some(EventKind::ReactionAdd), move |feature| {
            feature.handle_reaction_add(event)
        })
        .await
    }

    pub async fn dispatch_reaction_remove(
        &self,
        event: &ReactionEvent,
    ) -> Result<Option<String>, FeatureError> {
        self.scan("reaction_remove", Some(EventKind::ReactionRemove), move |feature| {
            feature.handle_reaction_remove(event)
        })
        .await
    }

    pub async fn dispatch_member_join(
        &self,
        event: &MemberEvent,
    ) -> Result<Option<String>, FeatureError> {
        self.scan("member_join", Some(EventKind::MemberJoin), move |feature| {
            feature.handle_member_join(event)
        })
        .await
    }

    pub async fn dispatch_member_leave(
        &self,
        event: &MemberEvent,
    ) -> Result<Option<String>, FeatureError> {
        self.scan("member_leave", Some(EventKind::MemberLeave), move |feature| {
            feature.handle_member_leave(event)
        })
        .await
    }

    /// Route a message through the index, then hand it to every subscribed
    /// feature. Returns the total number of recipients.
    pub async fn dispatch_message(&self, event: &MessageEvent) -> usize {
        let routed = self.router.route_message_create(event).await;
        let fanned = self
            .fan_out("message", EventKind::Message, move |feature| {
                feature.handle_message(event)
            })
            .await;
        routed + fanned
    }

    pub async fn dispatch_message_delete(&self, event: &MessageDeleteEvent) -> usize {
        self.router.route_message_delete(event).await
    }

    /// Route a voice-state change as a join or leave, then hand the raw
    /// event to every subscribed feature.
    pub async fn dispatch_voice_state(&self, event: &VoiceStateEvent) -> usize {
        let routed = self.router.route_voice_state(event).await;
        let fanned = self
            .fan_out("voice_state", EventKind::VoiceState, move |feature| {
                feature.handle_voice_state_update(event)
            })
            .await;
        routed + fanned
    }

    /// Single entry point for the gateway pump.
    pub async fn dispatch(&self, event: &GatewayEvent) -> Result<(), FeatureError> {
        match event {
            GatewayEvent::MessageCreate(e) => {
                self.dispatch_message(e).await;
            }
            GatewayEvent::MessageDelete(e) => {
                self.dispatch_message_delete(e).await;
            }
            GatewayEvent::VoiceStateUpdate(e) => {
                self.dispatch_voice_state(e).await;
            }
            GatewayEvent::Interaction(e) => {
                self.dispatch_interaction(e).await?;
            }
            GatewayEvent::ReactionAdd(e) => {
                self.dispatch_reaction_add(e).await?;
            }
            GatewayEvent::ReactionRemove(e) => {
                self.dispatch_reaction_remove(e).await?;
            }
            GatewayEvent::MemberJoin(e) => {
                self.dispatch_member_join(e).await?;
            }
            GatewayEvent::MemberLeave(e) => {
                self.dispatch_member_leave(e).await?;
            }
        }
        Ok(())
    }

    fn subscribed(&self, kind: Option<EventKind>) -> impl Iterator<Item = &Arc<dyn Feature>> {
        self.features
            .values()
            .filter(move |feature| kind.is_none_or(|kind| feature.subscribes_to(kind)))
    }

    async fn scan<'a, F>(
        &'a self,
        what: &str,
        kind: Option<EventKind>,
        offer: F,
    ) -> Result<Option<String>, FeatureError>
    where
        F: Fn(&'a dyn Feature) -> BoxFuture<'a, Result<Dispatch, FeatureError>>,
    {
        for feature in self.subscribed(kind) {
            match offer(feature.as_ref()).await {
                Ok(Dispatch::Handled) => {
                    debug!(event = what, feature = feature.name(), "Event claimed");
                    return Ok(Some(feature.name().to_string()));
                }
                Ok(Dispatch::NotHandled) => continue,
                Err(e) => {
                    warn!(
                        event = what,
                        feature = feature.name(),
                        error = %e,
                        "Feature failed; dispatch halted"
                    );
                    return Err(e);
                }
            }
        }
        debug!(event = what, "No feature claimed event");
        Ok(None)
    }

    async fn fan_out<'a, F>(&'a self, what: &str, kind: EventKind, offer: F) -> usize
    where
        F: Fn(&'a dyn Feature) -> BoxFuture<'a, Result<(), FeatureError>>,
    {
        let mut delivered = 0;
        for feature in self.subscribed(Some(kind)) {
            delivered += 1;
            if let Err(e) = offer(feature.as_ref()).await {
                warn!(event = what, feature = feature.name(), error = %e, "Feature failed");
            }
        }
        delivered
    }
}
