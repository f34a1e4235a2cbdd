//! Worker status registry.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::ids::WorkerId;
use crate::store::Store;

/// Availability of a worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Available,
    Busy,
    /// Also what an absent or lapsed key reads as.
    Offline,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            other => Err(format!("unknown worker status '{other}'")),
        }
    }
}

/// Leased worker status entries under `<namespace>:slaves:status:<id>`.
pub struct StatusRegistry {
    store: Arc<dyn Store>,
    namespace: String,
    lease: Duration,
}

impl StatusRegistry {
    pub fn new(store: Arc<dyn Store>, namespace: impl Into<String>, lease: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            lease,
        }
    }

    fn key(&self, worker: &WorkerId) -> String {
        format!("{}:slaves:status:{worker}", self.namespace)
    }

    /// Write a status with an explicit lease.
    pub async fn set_status(
        &self,
        worker: &WorkerId,
        status: WorkerStatus,
        lease: Duration,
    ) -> Result<(), StoreError> {
        self.store
            .set_ex(&self.key(worker), status.as_str(), lease)
            .await?;
        debug!(worker = %worker, status = %status, lease_secs = lease.as_secs(), "Worker status set");
        Ok(())
    }

    /// Write a status with the registry's default lease.
    pub async fn set(&self, worker: &WorkerId, status: WorkerStatus) -> Result<(), StoreError> {
        self.set_status(worker, status, self.lease).await
    }

    /// Current status. Absent, lapsed and unreadable entries are `Offline`.
    pub async fn get_status(&self, worker: &WorkerId) -> Result<WorkerStatus, StoreError> {
        let Some(raw) = self.store.get(&self.key(worker)).await? else {
            return Ok(WorkerStatus::Offline);
        };
        match raw.parse() {
            Ok(status) => Ok(status),
            Err(reason) => {
                warn!(worker = %worker, %reason, "Unreadable worker status, treating as offline");
                Ok(WorkerStatus::Offline)
            }
        }
    }

    /// First `available` worker in candidate order.
    ///
    /// Check-then-act: nothing reserves the worker between this read and the
    /// caller's `busy` write, so two concurrent callers can both get it.
    pub async fn pick_available(
        &self,
        candidates: &[WorkerId],
    ) -> Result<Option<WorkerId>, StoreError> {
        for worker in candidates {
            if self.get_status(worker).await? == WorkerStatus::Available {
                return Ok(Some(worker.clone()));
            }
        }
        Ok(None)
    }

    /// Status of every worker in `roster`, in roster order.
    pub async fn snapshot(
        &self,
        roster: &[WorkerId],
    ) -> Result<Vec<(WorkerId, WorkerStatus)>, StoreError> {
        let mut out = Vec::with_capacity(roster.len());
        for worker in roster {
            out.push((worker.clone(), self.get_status(worker).await?));
        }
        Ok(out)
    }
}
