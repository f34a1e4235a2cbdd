//! Platform event types consumed from the gateway.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, GuildId, UserId};
use crate::queue::Scalar;

/// A message posted in a guild text channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: String,
    pub author_id: UserId,
    #[serde(default)]
    pub content: String,
}

/// A message deleted from a guild text channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeleteEvent {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: String,
}

/// Raw "voice state changed" notification.
///
/// The platform reports both sides of the transition; the router derives
/// joins and leaves from them (see [`super::VoiceTransition`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceStateEvent {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default)]
    pub previous_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

/// A slash-command style interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: String,
    pub guild_id: GuildId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub user_id: UserId,
    /// Top-level command name, e.g. `onboarding`.
    pub command: String,
    /// Sub-command, e.g. `start`.
    #[serde(default)]
    pub subcommand: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, Scalar>,
}

/// A reaction added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: String,
    pub user_id: UserId,
    pub emoji: String,
}

/// A member joining or leaving a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub guild_id: GuildId,
    pub user_id: UserId,
}

/// Every event the gateway can deliver, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    MessageCreate(MessageEvent),
    MessageDelete(MessageDeleteEvent),
    VoiceStateUpdate(VoiceStateEvent),
    Interaction(InteractionEvent),
    ReactionAdd(ReactionEvent),
    ReactionRemove(ReactionEvent),
    MemberJoin(MemberEvent),
    MemberLeave(MemberEvent),
}

impl GatewayEvent {
    /// The guild this event belongs to.
    pub fn guild_id(&self) -> &GuildId {
        match self {
            Self::MessageCreate(e) => &e.guild_id,
            Self::MessageDelete(e) => &e.guild_id,
            Self::VoiceStateUpdate(e) => &e.guild_id,
            Self::Interaction(e) => &e.guild_id,
            Self::ReactionAdd(e) | Self::ReactionRemove(e) => &e.guild_id,
            Self::MemberJoin(e) | Self::MemberLeave(e) => &e.guild_id,
        }
    }

    /// Wire tag, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MessageCreate(_) => "message_create",
            Self::MessageDelete(_) => "message_delete",
            Self::VoiceStateUpdate(_) => "voice_state_update",
            Self::Interaction(_) => "interaction",
            Self::ReactionAdd(_) => "reaction_add",
            Self::ReactionRemove(_) => "reaction_remove",
            Self::MemberJoin(_) => "member_join",
            Self::MemberLeave(_) => "member_leave",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_voice_event_without_previous_channel() {
        let raw = r#"{"type":"voice_state_update","guild_id":"g1","user_id":"u1","channel_id":"c9"}"#;
        let event: GatewayEvent = serde_json::from_str(raw).unwrap();
        match &event {
            GatewayEvent::VoiceStateUpdate(v) => {
                assert_eq!(v.previous_channel_id, None);
                assert_eq!(v.channel_id, Some(ChannelId::from("c9")));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(event.kind(), "voice_state_update");
        assert_eq!(event.guild_id().as_str(), "g1");
    }

    #[test]
    fn parses_interaction_options() {
        let raw = r#"{
            "type": "interaction",
            "id": "i1",
            "guild_id": "g1",
            "user_id": "u1",
            "command": "onboarding",
            "options": {"role_id": "r1", "stations": 3}
        }"#;
        let event: GatewayEvent = serde_json::from_str(raw).unwrap();
        let GatewayEvent::Interaction(interaction) = event else {
            panic!("expected interaction");
        };
        assert_eq!(interaction.subcommand, None);
        assert_eq!(interaction.options["role_id"], Scalar::from("r1"));
        assert_eq!(interaction.options["stations"], Scalar::Integer(3));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(serde_json::from_str::<GatewayEvent>(r#"{"type":"typing_start"}"#).is_err());
    }
}
