//! In-process store: used by tests and by the local development loop.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

use crate::error::StoreError;

use super::traits::Store;

/// Stand-in for "never" when `now + span` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

fn deadline(now: Instant, span: Duration) -> Instant {
    now.checked_add(span).unwrap_or_else(|| now + FAR_FUTURE)
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Default)]
struct State {
    values: HashMap<String, Entry>,
    lists: HashMap<String, VecDeque<String>>,
}

impl State {
    /// Drop `key` if its lease has lapsed and report whether it is still live.
    fn live(&mut self, key: &str, now: Instant) -> bool {
        let live = self.values.get(key).is_some_and(|e| e.is_live(now));
        if !live {
            self.values.remove(key);
        }
        live
    }
}

/// Memory-backed [`Store`] with Redis-like expiry and blocking pop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    pushed: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().await;
        if !state.live(key, Instant::now()) {
            return Ok(None);
        }
        Ok(state.values.get(key).map(|e| e.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.values.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: deadline(Instant::now(), ttl),
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if state.live(key, now) {
            return Ok(false);
        }
        state.values.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: deadline(now, ttl),
            },
        );
        Ok(true)
    }

    async fn set_keep_ttl(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if !state.live(key, Instant::now()) {
            return Ok(false);
        }
        if let Some(entry) = state.values.get_mut(key) {
            entry.value = value.to_string();
        }
        Ok(true)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.live(key, Instant::now()))
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.values.remove(key);
        state.lists.remove(key);
        Ok(())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut state = self.state.lock().await;
            state
                .lists
                .entry(key.to_string())
                .or_default()
                .push_back(value.to_string());
        }
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError> {
        let until = deadline(Instant::now(), timeout);
        loop {
            // Register for wakeups before checking, so a push landing between
            // the check and the wait is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(list) = state.lists.get_mut(key)
                    && let Some(value) = list.pop_front()
                {
                    if list.is_empty() {
                        state.lists.remove(key);
                    }
                    return Ok(Some(value));
                }
            }

            if tokio::time::timeout_at(until, notified).await.is_err() {
                debug!(key, "blpop timed out");
                return Ok(None);
            }
        }
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .lists
            .get(key)
            .map_or(0, VecDeque::len))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn values_expire() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "v", Duration::from_millis(30))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn unbounded_lease_and_wait_do_not_overflow() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::MAX).await.unwrap();
        assert!(store.set_nx_ex("n", "v", Duration::MAX).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.exists("n").await.unwrap());

        store.rpush("q", "a").await.unwrap();
        assert_eq!(store.blpop("q", Duration::MAX).await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn set_nx_only_writes_absent_keys() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        assert!(store.set_nx_ex("k", "first", ttl).await.unwrap());
        assert!(!store.set_nx_ex("k", "second", ttl).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn set_nx_succeeds_after_expiry() {
        let store = MemoryStore::new();
        assert!(
            store
                .set_nx_ex("k", "old", Duration::from_millis(20))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(
            store
                .set_nx_ex("k", "new", Duration::from_secs(60))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn set_keep_ttl_requires_existing_key() {
        let store = MemoryStore::new();
        assert!(!store.set_keep_ttl("k", "v").await.unwrap());
        assert!(!store.exists("k").await.unwrap());

        store
            .set_ex("k", "v1", Duration::from_millis(40))
            .await
            .unwrap();
        assert!(store.set_keep_ttl("k", "v2").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        // The original lease still applies.
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let store = MemoryStore::new();
        store.del("missing").await.unwrap();
        store.set_ex("k", "v", Duration::from_secs(5)).await.unwrap();
        store.del("k").await.unwrap();
        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn lists_are_fifo() {
        let store = MemoryStore::new();
        store.rpush("q", "a").await.unwrap();
        store.rpush("q", "b").await.unwrap();
        assert_eq!(store.llen("q").await.unwrap(), 2);

        let timeout = Duration::from_millis(10);
        assert_eq!(store.blpop("q", timeout).await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.blpop("q", timeout).await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.blpop("q", timeout).await.unwrap(), None);
        assert_eq!(store.llen("q").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blpop_wakes_on_push() {
        let store = Arc::new(MemoryStore::new());
        let consumer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.blpop("q", Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.rpush("q", "late").await.unwrap();

        let popped = consumer.await.unwrap().unwrap();
        assert_eq!(popped.as_deref(), Some("late"));
    }
}
