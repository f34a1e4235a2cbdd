//! Task wire model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QueueError;
use crate::ids::GuildId;

/// Task kind for a new onboarding session.
pub const ONBOARDING_START: &str = "onboarding_start";

/// A flat payload value. Nested structures are not allowed on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A unit of work for a worker process.
///
/// Built by the producer, then treated as immutable: the queue owns it until
/// it is popped, after which it belongs to the consuming worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub guild_id: GuildId,
    #[serde(default)]
    pub payload: BTreeMap<String, Scalar>,
    pub created_at: DateTime<Utc>,
    /// Tracked for consumers; this crate always writes 0.
    #[serde(default)]
    pub retries: u32,
}

impl Task {
    pub fn new(kind: impl Into<String>, guild_id: GuildId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            guild_id,
            payload: BTreeMap::new(),
            created_at: Utc::now(),
            retries: 0,
        }
    }

    /// Builder-style payload insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Merge a caller-supplied payload. Existing keys win.
    pub fn with_payload(mut self, payload: BTreeMap<String, Scalar>) -> Self {
        for (key, value) in payload {
            self.payload.entry(key).or_insert(value);
        }
        self
    }

    /// String payload field, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Scalar::as_str)
    }

    pub(crate) fn encode(&self) -> Result<String, QueueError> {
        serde_json::to_string(self).map_err(|e| QueueError::Encode(e.to_string()))
    }

    pub(crate) fn decode(raw: &str) -> Result<Self, QueueError> {
        let task: Self = serde_json::from_str(raw).map_err(|e| QueueError::Decode {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;
        if task.id.is_empty() || task.kind.is_empty() {
            return Err(QueueError::Decode {
                reason: "task id and type must not be empty".to_string(),
                raw: raw.to_string(),
            });
        }
        Ok(task)
    }
}
