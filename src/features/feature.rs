//! Feature trait: the unit the registry dispatches to.

use async_trait::async_trait;

use crate::error::FeatureError;
use crate::events::{InteractionEvent, MemberEvent, MessageEvent, ReactionEvent, VoiceStateEvent};

/// Outcome of offering an event to a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The feature claimed the event; stop scanning.
    Handled,
    /// Not this feature's event; try the next one.
    NotHandled,
}

/// Optional, low-frequency event kinds a feature can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    ReactionAdd,
    ReactionRemove,
    VoiceState,
    MemberJoin,
    MemberLeave,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Message => "message",
            Self::ReactionAdd => "reaction_add",
            Self::ReactionRemove => "reaction_remove",
            Self::VoiceState => "voice_state",
            Self::MemberJoin => "member_join",
            Self::MemberLeave => "member_leave",
        };
        write!(f, "{s}")
    }
}

/// A bot feature.
///
/// Every feature answers interactions. The other handlers are only called
/// when [`Feature::subscribes_to`] returns `true` for their kind.
#[async_trait]
pub trait Feature: Send + Sync {
    /// Unique, non-empty name.
    fn name(&self) -> &str;

    fn subscribes_to(&self, _kind: EventKind) -> bool {
        false
    }

    async fn handle_interaction(&self, event: &InteractionEvent)
    -> Result<Dispatch, FeatureError>;

    /// Fan-out: every subscribed feature sees every message.
    async fn handle_message(&self, _event: &MessageEvent) -> Result<(), FeatureError> {
        Ok(())
    }

    async fn handle_reaction_add(&self, _event: &ReactionEvent) -> Result<Dispatch, FeatureError> {
        Ok(Dispatch::NotHandled)
    }

    async fn handle_reaction_remove(
        &self,
        _event: &ReactionEvent,
    ) -> Result<Dispatch, FeatureError> {
        Ok(Dispatch::NotHandled)
    }

    /// Fan-out, like [`Feature::handle_message`].
    async fn handle_voice_state_update(
        &self,
        _event: &VoiceStateEvent,
    ) -> Result<(), FeatureError> {
        Ok(())
    }

    async fn handle_member_join(&self, _event: &MemberEvent) -> Result<Dispatch, FeatureError> {
        Ok(Dispatch::NotHandled)
    }

    async fn handle_member_leave(&self, _event: &MemberEvent) -> Result<Dispatch, FeatureError> {
        Ok(Dispatch::NotHandled)
    }
}
