//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;
use crate::ids::WorkerId;
use crate::onboarding::SESSION_LEASE;
use crate::queue::DEFAULT_DEQUEUE_WAIT;

/// Prefix for every environment variable the bot reads.
const ENV_PREFIX: &str = "STATION_BOT_";

/// Upper bound for lease settings, in seconds (30 days).
const MAX_LEASE_SECS: u64 = 30 * 24 * 60 * 60;

/// Upper bound for the dequeue wait, in milliseconds (1 hour).
const MAX_DEQUEUE_MS: u64 = 60 * 60 * 1000;

/// Which shared store backs the queue, status registry and session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store. State dies with the process.
    Memory,
    /// Redis, shared with the worker processes.
    Redis,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}STORE"),
                message: format!("unknown store backend '{other}' (expected memory or redis)"),
            }),
        }
    }
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Key namespace shared with the worker processes.
    pub namespace: String,
    /// Store backend.
    pub store: StoreBackend,
    /// Redis connection URL (only used with [`StoreBackend::Redis`]).
    pub redis_url: String,
    /// Ordered worker roster. Selection always walks it front to back.
    pub workers: Vec<WorkerId>,
    /// Lease written with every worker status update.
    pub status_lease: Duration,
    /// Lease on an onboarding session. There is no renewal path.
    pub session_lease: Duration,
    /// Default wait for a task consumer polling the queue.
    pub dequeue_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            namespace: "station".to_string(),
            store: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            workers: ["slave-1", "slave-2", "slave-3"]
                .into_iter()
                .map(WorkerId::from)
                .collect(),
            status_lease: Duration::from_secs(60),
            session_lease: SESSION_LEASE,
            dequeue_timeout: DEFAULT_DEQUEUE_WAIT,
        }
    }
}

impl BotConfig {
    /// Load configuration from `STATION_BOT_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(namespace) = var("NAMESPACE") {
            let namespace = namespace.trim().to_string();
            if namespace.is_empty() {
                return Err(invalid("NAMESPACE", "must not be empty"));
            }
            config.namespace = namespace;
        }
        if let Some(store) = var("STORE") {
            config.store = store.parse()?;
        }
        if let Some(url) = var("REDIS_URL") {
            config.redis_url = url;
        }
        if let Some(workers) = var("WORKERS") {
            config.workers = parse_roster(&workers)?;
        }
        if let Some(secs) = var("STATUS_LEASE_SECS") {
            config.status_lease =
                Duration::from_secs(parse_positive("STATUS_LEASE_SECS", &secs, MAX_LEASE_SECS)?);
        }
        if let Some(secs) = var("SESSION_LEASE_SECS") {
            config.session_lease =
                Duration::from_secs(parse_positive("SESSION_LEASE_SECS", &secs, MAX_LEASE_SECS)?);
        }
        if let Some(ms) = var("DEQUEUE_TIMEOUT_MS") {
            config.dequeue_timeout =
                Duration::from_millis(parse_positive("DEQUEUE_TIMEOUT_MS", &ms, MAX_DEQUEUE_MS)?);
        }

        Ok(config)
    }
}

fn parse_roster(raw: &str) -> Result<Vec<WorkerId>, ConfigError> {
    let workers: Vec<WorkerId> = raw
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(WorkerId::from)
        .collect();
    if workers.is_empty() {
        return Err(invalid("WORKERS", "roster must name at least one worker"));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = workers.iter().find(|w| !seen.insert(*w)) {
        return Err(invalid("WORKERS", &format!("worker '{dup}' listed twice")));
    }
    Ok(workers)
}

fn parse_positive(name: &str, raw: &str, max: u64) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid(name, "must be greater than zero")),
        Ok(n) if n > max => Err(invalid(name, &format!("must be at most {max}"))),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(name, &e.to_string())),
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{name}"),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.namespace, "station");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.workers.len(), 3);
        assert_eq!(config.session_lease, Duration::from_secs(900));
    }

    #[test]
    fn roster_keeps_order() {
        let config = load(&[("STATION_BOT_WORKERS", "w3, w1 ,w2")]).unwrap();
        let names: Vec<&str> = config.workers.iter().map(WorkerId::as_str).collect();
        assert_eq!(names, ["w3", "w1", "w2"]);
    }

    #[test]
    fn rejects_empty_roster() {
        let err = load(&[("STATION_BOT_WORKERS", " , ")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "STATION_BOT_WORKERS"));
    }

    #[test]
    fn rejects_duplicate_worker() {
        assert!(load(&[("STATION_BOT_WORKERS", "a,b,a")]).is_err());
    }

    #[test]
    fn rejects_unknown_backend_and_bad_numbers() {
        assert!(load(&[("STATION_BOT_STORE", "etcd")]).is_err());
        assert!(load(&[("STATION_BOT_SESSION_LEASE_SECS", "soon")]).is_err());
        assert!(load(&[("STATION_BOT_STATUS_LEASE_SECS", "0")]).is_err());
    }

    #[test]
    fn rejects_out_of_range_durations() {
        let err = load(&[("STATION_BOT_SESSION_LEASE_SECS", "18446744073709551615")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "STATION_BOT_SESSION_LEASE_SECS")
        );
        assert!(load(&[("STATION_BOT_DEQUEUE_TIMEOUT_MS", "3600001")]).is_err());

        let config = load(&[("STATION_BOT_STATUS_LEASE_SECS", "2592000")]).unwrap();
        assert_eq!(config.status_lease, Duration::from_secs(MAX_LEASE_SECS));
    }

    #[test]
    fn parses_redis_backend() {
        let config = load(&[
            ("STATION_BOT_STORE", "Redis"),
            ("STATION_BOT_REDIS_URL", "redis://cache:6379/2"),
            ("STATION_BOT_DEQUEUE_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Redis);
        assert_eq!(config.redis_url, "redis://cache:6379/2");
        assert_eq!(config.dequeue_timeout, Duration::from_millis(250));
    }
}
