//! `/onboarding` command: hands new members to the worker pool.
//!
//! `start` (the default) asks the coordinator for a worker; `status` logs the
//! roster. Results go to the log because replying is the platform binding's
//! job. A member leaving the guild drops their live session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{FeatureError, OnboardingError};
use crate::events::{InteractionEvent, MemberEvent};
use crate::features::{Dispatch, EventKind, Feature};
use crate::onboarding::OnboardingCoordinator;

/// Slash command this feature answers.
pub const COMMAND: &str = "onboarding";

pub struct OnboardingFeature {
    coordinator: Arc<OnboardingCoordinator>,
}

impl OnboardingFeature {
    pub fn new(coordinator: Arc<OnboardingCoordinator>) -> Self {
        Self { coordinator }
    }

    async fn start(&self, event: &InteractionEvent) -> Result<Dispatch, FeatureError> {
        let result = self
            .coordinator
            .start_onboarding(&event.guild_id, &event.user_id, event.options.clone())
            .await;
        match result {
            Ok(assignment) => {
                info!(
                    guild = %event.guild_id,
                    user = %event.user_id,
                    worker = %assignment.worker,
                    task_id = %assignment.task_id,
                    "Onboarding started"
                );
                Ok(Dispatch::Handled)
            }
            // Expected refusals: the interaction is still ours.
            Err(e @ (OnboardingError::AlreadyActive { .. } | OnboardingError::NoWorkerAvailable)) => {
                warn!(
                    guild = %event.guild_id,
                    user = %event.user_id,
                    reason = %e,
                    "Onboarding refused"
                );
                Ok(Dispatch::Handled)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn status(&self, event: &InteractionEvent) -> Result<Dispatch, FeatureError> {
        let roster = self
            .coordinator
            .roster_status()
            .await
            .map_err(OnboardingError::from)?;
        for (worker, status) in &roster {
            info!(guild = %event.guild_id, worker = %worker, status = %status, "Worker status");
        }
        Ok(Dispatch::Handled)
    }
}

#[async_trait]
impl Feature for OnboardingFeature {
    fn name(&self) -> &str {
        "onboarding"
    }

    fn subscribes_to(&self, kind: EventKind) -> bool {
        kind == EventKind::MemberLeave
    }

    async fn handle_interaction(
        &self,
        event: &InteractionEvent,
    ) -> Result<Dispatch, FeatureError> {
        if event.command != COMMAND {
            return Ok(Dispatch::NotHandled);
        }
        match event.subcommand.as_deref().unwrap_or("start") {
            "start" => self.start(event).await,
            "status" => self.status(event).await,
            other => Err(FeatureError::InvalidEvent(format!(
                "unknown onboarding subcommand '{other}'"
            ))),
        }
    }

    async fn handle_member_leave(&self, event: &MemberEvent) -> Result<Dispatch, FeatureError> {
        match self
            .coordinator
            .abandon(&event.guild_id, &event.user_id)
            .await?
        {
            Some(_) => Ok(Dispatch::Handled),
            None => Ok(Dispatch::NotHandled),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::BotConfig;
    use crate::ids::{GuildId, UserId, WorkerId};
    use crate::queue::Scalar;
    use crate::store::{MemoryStore, Store};
    use crate::workers::WorkerStatus;

    async fn feature(available: &[&str]) -> (OnboardingFeature, Arc<OnboardingCoordinator>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let config = BotConfig {
            namespace: "test".to_string(),
            workers: ["w1", "w2"].into_iter().map(WorkerId::from).collect(),
            ..BotConfig::default()
        };
        let coordinator = Arc::new(OnboardingCoordinator::from_config(store, &config));
        for worker in available {
            coordinator
                .statuses()
                .set(&WorkerId::from(*worker), WorkerStatus::Available)
                .await
                .unwrap();
        }
        (OnboardingFeature::new(Arc::clone(&coordinator)), coordinator)
    }

    fn command(command: &str, subcommand: Option<&str>) -> InteractionEvent {
        let mut options = BTreeMap::new();
        options.insert("station".to_string(), Scalar::from("lobby"));
        InteractionEvent {
            id: "i1".to_string(),
            guild_id: GuildId::from("g"),
            channel_id: None,
            user_id: UserId::from("u"),
            command: command.to_string(),
            subcommand: subcommand.map(str::to_string),
            options,
        }
    }

    #[tokio::test]
    async fn ignores_other_commands() {
        let (feature, _) = feature(&["w1"]).await;
        let outcome = feature
            .handle_interaction(&command("poll", None))
            .await
            .unwrap();
        assert_eq!(outcome, Dispatch::NotHandled);
    }

    #[tokio::test]
    async fn start_enqueues_with_options_as_payload() {
        let (feature, coordinator) = feature(&["w2"]).await;

        let outcome = feature
            .handle_interaction(&command("onboarding", None))
            .await
            .unwrap();
        assert_eq!(outcome, Dispatch::Handled);

        let task = coordinator
            .queue()
            .dequeue(std::time::Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.payload_str("worker_id"), Some("w2"));
        assert_eq!(task.payload_str("station"), Some("lobby"));
    }

    #[tokio::test]
    async fn refusal_is_still_claimed() {
        let (feature, _) = feature(&[]).await;
        let outcome = feature
            .handle_interaction(&command("onboarding", Some("start")))
            .await
            .unwrap();
        assert_eq!(outcome, Dispatch::Handled);
    }

    #[tokio::test]
    async fn unknown_subcommand_is_an_error() {
        let (feature, _) = feature(&["w1"]).await;
        let result = feature
            .handle_interaction(&command("onboarding", Some("teleport")))
            .await;
        assert!(matches!(result, Err(FeatureError::InvalidEvent(_))));
    }

    #[tokio::test]
    async fn member_leave_drops_the_session() {
        let (feature, coordinator) = feature(&["w1"]).await;
        feature
            .handle_interaction(&command("onboarding", None))
            .await
            .unwrap();

        let leave = MemberEvent {
            guild_id: GuildId::from("g"),
            user_id: UserId::from("u"),
        };
        assert_eq!(
            feature.handle_member_leave(&leave).await.unwrap(),
            Dispatch::Handled
        );
        assert!(
            !coordinator
                .sessions()
                .is_active(&leave.guild_id, &leave.user_id)
                .await
                .unwrap()
        );
        assert_eq!(
            feature.handle_member_leave(&leave).await.unwrap(),
            Dispatch::NotHandled
        );
    }
}
