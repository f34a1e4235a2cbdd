//! Onboarding session store: at most one live session per (guild, user).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::OnboardingError;
use crate::ids::{ChannelId, GuildId, UserId, WorkerId};
use crate::store::Store;

/// Default session lease: 15 minutes, no renewal.
pub const SESSION_LEASE: Duration = Duration::from_secs(15 * 60);

/// A user's in-progress onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingSession {
    pub worker_id: WorkerId,
    /// Station voice channel, filled in by the worker once it has one.
    #[serde(default)]
    pub voice_channel_id: Option<ChannelId>,
    pub started_at: DateTime<Utc>,
}

impl OnboardingSession {
    pub fn new(worker_id: WorkerId) -> Self {
        Self {
            worker_id,
            voice_channel_id: None,
            started_at: Utc::now(),
        }
    }
}

/// Leased session records under `<namespace>:session:<guild>:<user>`.
///
/// Expiry is the only garbage collection. A session that outlives its lease
/// disappears even if the worker is still busy with it.
pub struct SessionStore {
    store: Arc<dyn Store>,
    namespace: String,
    lease: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn Store>, namespace: impl Into<String>, lease: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            lease,
        }
    }

    fn key(&self, guild: &GuildId, user: &UserId) -> String {
        format!("{}:session:{guild}:{user}", self.namespace)
    }

    /// Record a new session. Fails with `AlreadyActive` when one is live.
    pub async fn try_start(
        &self,
        guild: &GuildId,
        user: &UserId,
        session: &OnboardingSession,
    ) -> Result<(), OnboardingError> {
        let record = encode(session)?;
        let written = self
            .store
            .set_nx_ex(&self.key(guild, user), &record, self.lease)
            .await?;
        if !written {
            return Err(OnboardingError::AlreadyActive {
                guild: guild.clone(),
                user: user.clone(),
            });
        }
        info!(
            guild = %guild,
            user = %user,
            worker = %session.worker_id,
            "Onboarding session started"
        );
        Ok(())
    }

    /// Live session for (guild, user), if any.
    pub async fn get(
        &self,
        guild: &GuildId,
        user: &UserId,
    ) -> Result<Option<OnboardingSession>, OnboardingError> {
        match self.store.get(&self.key(guild, user)).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn is_active(&self, guild: &GuildId, user: &UserId) -> Result<bool, OnboardingError> {
        Ok(self.store.exists(&self.key(guild, user)).await?)
    }

    /// Record the station voice channel. Keeps the original lease.
    pub async fn attach_voice_channel(
        &self,
        guild: &GuildId,
        user: &UserId,
        channel: ChannelId,
    ) -> Result<OnboardingSession, OnboardingError> {
        let not_found = || OnboardingError::SessionNotFound {
            guild: guild.clone(),
            user: user.clone(),
        };
        let mut session = self.get(guild, user).await?.ok_or_else(not_found)?;
        session.voice_channel_id = Some(channel);
        let updated = self
            .store
            .set_keep_ttl(&self.key(guild, user), &encode(&session)?)
            .await?;
        if !updated {
            return Err(not_found());
        }
        Ok(session)
    }

    /// Drop the session. Ending an absent session is fine.
    pub async fn end(&self, guild: &GuildId, user: &UserId) -> Result<(), OnboardingError> {
        self.store.del(&self.key(guild, user)).await?;
        debug!(guild = %guild, user = %user, "Onboarding session ended");
        Ok(())
    }
}

fn encode(session: &OnboardingSession) -> Result<String, OnboardingError> {
    serde_json::to_string(session).map_err(|e| OnboardingError::Session(e.to_string()))
}

fn decode(raw: &str) -> Result<OnboardingSession, OnboardingError> {
    serde_json::from_str(raw).map_err(|e| OnboardingError::Session(e.to_string()))
}
