//! OnboardingCoordinator: hands onboarding work to an available worker.
//!
//! Composition over the session store, the status registry and the task
//! queue. None of the steps are transactional; see [`OnboardingCoordinator::start_onboarding`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::BotConfig;
use crate::error::{OnboardingError, StoreError};
use crate::ids::{GuildId, UserId, WorkerId};
use crate::queue::{ONBOARDING_START, Scalar, Task, TaskQueue};
use crate::store::Store;
use crate::workers::{StatusRegistry, WorkerStatus};

use super::session::{OnboardingSession, SessionStore};

/// Result of a successful start.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub task_id: String,
    pub worker: WorkerId,
    pub session: OnboardingSession,
}

/// Coordinates onboarding starts across the worker pool.
pub struct OnboardingCoordinator {
    sessions: SessionStore,
    statuses: StatusRegistry,
    queue: TaskQueue,
    roster: Vec<WorkerId>,
}

impl OnboardingCoordinator {
    pub fn new(
        sessions: SessionStore,
        statuses: StatusRegistry,
        queue: TaskQueue,
        roster: Vec<WorkerId>,
    ) -> Self {
        Self {
            sessions,
            statuses,
            queue,
            roster,
        }
    }

    /// Wire all three stores onto one shared backend.
    pub fn from_config(store: Arc<dyn Store>, config: &BotConfig) -> Self {
        Self::new(
            SessionStore::new(store.clone(), &config.namespace, config.session_lease),
            StatusRegistry::new(store.clone(), &config.namespace, config.status_lease),
            TaskQueue::new(store, &config.namespace).with_default_wait(config.dequeue_timeout),
            config.workers.clone(),
        )
    }

    /// Start onboarding `user` in `guild`.
    ///
    /// 1. `AlreadyActive` if a live session exists.
    /// 2. First available worker in roster order, else `NoWorkerAvailable`.
    /// 3. Reserve the session (set-if-absent). Losing an overlapping start for
    ///    the same user surfaces here, before anything is queued.
    /// 4. Enqueue an `onboarding_start` task carrying the worker and `payload`.
    ///    On failure the reservation is released.
    /// 5. Mark the worker busy.
    ///
    /// Worker selection is still check-then-act: two starts for different
    /// users can pick the same worker.
    pub async fn start_onboarding(
        &self,
        guild: &GuildId,
        user: &UserId,
        payload: BTreeMap<String, Scalar>,
    ) -> Result<Assignment, OnboardingError> {
        if self.sessions.is_active(guild, user).await? {
            return Err(OnboardingError::AlreadyActive {
                guild: guild.clone(),
                user: user.clone(),
            });
        }

        let worker = self
            .statuses
            .pick_available(&self.roster)
            .await?
            .ok_or(OnboardingError::NoWorkerAvailable)?;

        let session = OnboardingSession::new(worker.clone());
        self.sessions.try_start(guild, user, &session).await?;

        let task = Task::new(ONBOARDING_START, guild.clone())
            .with("user_id", user.as_str())
            .with("worker_id", worker.as_str())
            .with_payload(payload);
        if let Err(e) = self.queue.enqueue(&task).await {
            if let Err(release) = self.sessions.end(guild, user).await {
                warn!(
                    guild = %guild,
                    user = %user,
                    error = %release,
                    "Failed to release session after enqueue failure"
                );
            }
            return Err(e.into());
        }

        self.statuses.set(&worker, WorkerStatus::Busy).await?;

        info!(
            guild = %guild,
            user = %user,
            worker = %worker,
            task_id = %task.id,
            "Onboarding assigned"
        );

        Ok(Assignment {
            task_id: task.id,
            worker,
            session,
        })
    }

    /// Release path for the worker side: clear the session and put the worker
    /// back in the pool.
    pub async fn complete(
        &self,
        guild: &GuildId,
        user: &UserId,
        worker: &WorkerId,
    ) -> Result<(), OnboardingError> {
        self.sessions.end(guild, user).await?;
        self.statuses.set(worker, WorkerStatus::Available).await?;
        info!(guild = %guild, user = %user, worker = %worker, "Onboarding completed");
        Ok(())
    }

    /// Drop a member's session without touching the worker, e.g. when the
    /// member leaves the guild. Returns the session that was live, if any.
    pub async fn abandon(
        &self,
        guild: &GuildId,
        user: &UserId,
    ) -> Result<Option<OnboardingSession>, OnboardingError> {
        let session = self.sessions.get(guild, user).await?;
        if let Some(ref live) = session {
            self.sessions.end(guild, user).await?;
            warn!(
                guild = %guild,
                user = %user,
                worker = %live.worker_id,
                "Onboarding abandoned"
            );
        }
        Ok(session)
    }

    /// Status of every roster worker, in roster order.
    pub async fn roster_status(&self) -> Result<Vec<(WorkerId, WorkerStatus)>, StoreError> {
        self.statuses.snapshot(&self.roster).await
    }

    pub fn roster(&self) -> &[WorkerId] {
        &self.roster
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }
}
