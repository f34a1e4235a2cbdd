//! Voice transition classification.

use crate::ids::ChannelId;

use super::model::VoiceStateEvent;

/// What a raw voice-state update means for indexed routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceTransition {
    /// Not in voice before, now in `channel`.
    Joined(ChannelId),
    /// Was in `channel`, now out of voice.
    Left(ChannelId),
    /// Moved directly between two channels. Routed to neither joins nor leaves.
    Moved { from: ChannelId, to: ChannelId },
    /// Mute/deafen toggles and the like; the channel did not change.
    Unchanged,
}

impl VoiceTransition {
    pub fn classify(event: &VoiceStateEvent) -> Self {
        match (&event.previous_channel_id, &event.channel_id) {
            (None, Some(to)) => Self::Joined(to.clone()),
            (Some(from), None) => Self::Left(from.clone()),
            (Some(from), Some(to)) if from != to => Self::Moved {
                from: from.clone(),
                to: to.clone(),
            },
            _ => Self::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{GuildId, UserId};

    fn event(prev: Option<&str>, next: Option<&str>) -> VoiceStateEvent {
        VoiceStateEvent {
            guild_id: GuildId::from("g"),
            user_id: UserId::from("u"),
            previous_channel_id: prev.map(ChannelId::from),
            channel_id: next.map(ChannelId::from),
        }
    }

    #[test]
    fn classifies_all_shapes() {
        assert_eq!(
            VoiceTransition::classify(&event(None, Some("c"))),
            VoiceTransition::Joined(ChannelId::from("c"))
        );
        assert_eq!(
            VoiceTransition::classify(&event(Some("c"), None)),
            VoiceTransition::Left(ChannelId::from("c"))
        );
        assert_eq!(
            VoiceTransition::classify(&event(Some("a"), Some("b"))),
            VoiceTransition::Moved {
                from: ChannelId::from("a"),
                to: ChannelId::from("b"),
            }
        );
        assert_eq!(
            VoiceTransition::classify(&event(Some("a"), Some("a"))),
            VoiceTransition::Unchanged
        );
        assert_eq!(
            VoiceTransition::classify(&event(None, None)),
            VoiceTransition::Unchanged
        );
    }
}
