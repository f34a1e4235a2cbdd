//! Event router: indexed dispatch for high-frequency events.
//!
//! Handlers are filed under guild → channel → registration order, one index
//! per event kind. Routing is a two-step key lookup; it never scans handlers
//! that registered for other channels.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::events::{MessageDeleteEvent, MessageEvent, VoiceStateEvent, VoiceTransition};
use crate::ids::{ChannelId, GuildId};

use super::handler::Handler;

/// Event kinds that go through the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedKind {
    MessageCreate,
    MessageDelete,
    VoiceJoin,
    VoiceLeave,
}

impl std::fmt::Display for IndexedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MessageCreate => "message_create",
            Self::MessageDelete => "message_delete",
            Self::VoiceJoin => "voice_join",
            Self::VoiceLeave => "voice_leave",
        };
        write!(f, "{s}")
    }
}

/// guild → channel → handlers, for one event kind.
struct HandlerIndex<E> {
    guilds: HashMap<GuildId, HashMap<ChannelId, Vec<Handler<E>>>>,
}

impl<E> Default for HandlerIndex<E> {
    fn default() -> Self {
        Self {
            guilds: HashMap::new(),
        }
    }
}

impl<E> HandlerIndex<E> {
    fn push(&mut self, guild: GuildId, channel: ChannelId, handler: Handler<E>) {
        self.guilds
            .entry(guild)
            .or_default()
            .entry(channel)
            .or_default()
            .push(handler);
    }

    fn bucket(&self, guild: &GuildId, channel: &ChannelId) -> Option<&Vec<Handler<E>>> {
        self.guilds.get(guild)?.get(channel)
    }

    fn remove_channel(&mut self, guild: &GuildId, channel: &ChannelId) -> usize {
        let Some(channels) = self.guilds.get_mut(guild) else {
            return 0;
        };
        let removed = channels.remove(channel).map_or(0, |h| h.len());
        if channels.is_empty() {
            self.guilds.remove(guild);
        }
        removed
    }

    fn remove_guild(&mut self, guild: &GuildId) -> usize {
        self.guilds
            .remove(guild)
            .map_or(0, |channels| channels.values().map(Vec::len).sum())
    }
}

#[derive(Default)]
struct Indexes {
    message_create: HandlerIndex<MessageEvent>,
    message_delete: HandlerIndex<MessageDeleteEvent>,
    voice_join: HandlerIndex<VoiceStateEvent>,
    voice_leave: HandlerIndex<VoiceStateEvent>,
}

/// Indexed router for message and voice events.
///
/// One reader/writer lock guards all indexes. `route_*` holds the read side
/// only long enough to clone the bucket, so handlers run unlocked and
/// registrations never wait on a slow handler.
#[derive(Default)]
pub struct EventRouter {
    indexes: RwLock<Indexes>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn on_message_create(
        &self,
        guild: GuildId,
        channel: ChannelId,
        handler: Handler<MessageEvent>,
    ) {
        debug!(kind = %IndexedKind::MessageCreate, guild = %guild, channel = %channel, "Handler registered");
        self.indexes
            .write()
            .await
            .message_create
            .push(guild, channel, handler);
    }

    pub async fn on_message_delete(
        &self,
        guild: GuildId,
        channel: ChannelId,
        handler: Handler<MessageDeleteEvent>,
    ) {
        debug!(kind = %IndexedKind::MessageDelete, guild = %guild, channel = %channel, "Handler registered");
        self.indexes
            .write()
            .await
            .message_delete
            .push(guild, channel, handler);
    }

    pub async fn on_voice_join(
        &self,
        guild: GuildId,
        channel: ChannelId,
        handler: Handler<VoiceStateEvent>,
    ) {
        debug!(kind = %IndexedKind::VoiceJoin, guild = %guild, channel = %channel, "Handler registered");
        self.indexes
            .write()
            .await
            .voice_join
            .push(guild, channel, handler);
    }

    pub async fn on_voice_leave(
        &self,
        guild: GuildId,
        channel: ChannelId,
        handler: Handler<VoiceStateEvent>,
    ) {
        debug!(kind = %IndexedKind::VoiceLeave, guild = %guild, channel = %channel, "Handler registered");
        self.indexes
            .write()
            .await
            .voice_leave
            .push(guild, channel, handler);
    }

    /// Remove every handler, of every kind, registered for (guild, channel).
    /// Returns how many were removed.
    pub async fn off(&self, guild: &GuildId, channel: &ChannelId) -> usize {
        let mut indexes = self.indexes.write().await;
        let removed = indexes.message_create.remove_channel(guild, channel)
            + indexes.message_delete.remove_channel(guild, channel)
            + indexes.voice_join.remove_channel(guild, channel)
            + indexes.voice_leave.remove_channel(guild, channel);
        debug!(guild = %guild, channel = %channel, removed, "Channel handlers removed");
        removed
    }

    /// Remove every handler registered anywhere in `guild`.
    pub async fn off_guild(&self, guild: &GuildId) -> usize {
        let mut indexes = self.indexes.write().await;
        let removed = indexes.message_create.remove_guild(guild)
            + indexes.message_delete.remove_guild(guild)
            + indexes.voice_join.remove_guild(guild)
            + indexes.voice_leave.remove_guild(guild);
        debug!(guild = %guild, removed, "Guild handlers removed");
        removed
    }

    /// Number of handlers in one bucket.
    pub async fn handler_count(
        &self,
        kind: IndexedKind,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> usize {
        let indexes = self.indexes.read().await;
        match kind {
            IndexedKind::MessageCreate => indexes.message_create.bucket(guild, channel).map(Vec::len),
            IndexedKind::MessageDelete => indexes.message_delete.bucket(guild, channel).map(Vec::len),
            IndexedKind::VoiceJoin => indexes.voice_join.bucket(guild, channel).map(Vec::len),
            IndexedKind::VoiceLeave => indexes.voice_leave.bucket(guild, channel).map(Vec::len),
        }
        .unwrap_or(0)
    }

    /// Deliver a posted message. Returns how many handlers ran.
    pub async fn route_message_create(&self, event: &MessageEvent) -> usize {
        let handlers = self
            .indexes
            .read()
            .await
            .message_create
            .bucket(&event.guild_id, &event.channel_id)
            .cloned();
        invoke(
            IndexedKind::MessageCreate,
            &event.guild_id,
            &event.channel_id,
            handlers,
            event,
        )
        .await
    }

    /// Deliver a message deletion. Returns how many handlers ran.
    pub async fn route_message_delete(&self, event: &MessageDeleteEvent) -> usize {
        let handlers = self
            .indexes
            .read()
            .await
            .message_delete
            .bucket(&event.guild_id, &event.channel_id)
            .cloned();
        invoke(
            IndexedKind::MessageDelete,
            &event.guild_id,
            &event.channel_id,
            handlers,
            event,
        )
        .await
    }

    /// Classify a voice-state change and deliver it as a join or a leave.
    ///
    /// Moves between two channels and same-channel updates reach no handler.
    pub async fn route_voice_state(&self, event: &VoiceStateEvent) -> usize {
        let (kind, channel) = match VoiceTransition::classify(event) {
            VoiceTransition::Joined(channel) => (IndexedKind::VoiceJoin, channel),
            VoiceTransition::Left(channel) => (IndexedKind::VoiceLeave, channel),
            VoiceTransition::Moved { from, to } => {
                debug!(guild = %event.guild_id, user = %event.user_id, %from, %to, "Voice move not routed");
                return 0;
            }
            VoiceTransition::Unchanged => return 0,
        };

        let handlers = {
            let indexes = self.indexes.read().await;
            let index = match kind {
                IndexedKind::VoiceJoin => &indexes.voice_join,
                _ => &indexes.voice_leave,
            };
            index.bucket(&event.guild_id, &channel).cloned()
        };
        invoke(kind, &event.guild_id, &channel, handlers, event).await
    }
}

/// Run a bucket in registration order. A failing (or panicking) handler is
/// logged and the rest of the bucket still runs.
async fn invoke<E>(
    kind: IndexedKind,
    guild: &GuildId,
    channel: &ChannelId,
    handlers: Option<Vec<Handler<E>>>,
    event: &E,
) -> usize {
    let Some(handlers) = handlers else {
        return 0;
    };
    for (position, handler) in handlers.iter().enumerate() {
        match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                kind = %kind,
                guild = %guild,
                channel = %channel,
                position,
                error = %e,
                "Handler failed"
            ),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&'static str>()
                    .map(|msg| (*msg).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(
                    kind = %kind,
                    guild = %guild,
                    channel = %channel,
                    position,
                    panic = %message,
                    "Handler panicked"
                );
            }
        }
    }
    handlers.len()
}
