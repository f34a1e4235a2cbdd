//! Task queue: durable FIFO of tasks over a shared store list.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::QueueError;
use crate::store::Store;

use super::task::Task;

/// FIFO task queue. Producers `enqueue`, a worker loop `dequeue`s.
///
/// No acknowledgement, no visibility timeout, no deduplication: enqueuing
/// the same task twice delivers it twice.
pub struct TaskQueue {
    store: Arc<dyn Store>,
    key: String,
    default_wait: Duration,
}

/// Wait used by [`TaskQueue::dequeue_default`] unless overridden.
pub const DEFAULT_DEQUEUE_WAIT: Duration = Duration::from_secs(5);

impl TaskQueue {
    /// Queue stored under `<namespace>:tasks`.
    pub fn new(store: Arc<dyn Store>, namespace: &str) -> Self {
        Self {
            store,
            key: format!("{namespace}:tasks"),
            default_wait: DEFAULT_DEQUEUE_WAIT,
        }
    }

    /// Override the wait used by [`Self::dequeue_default`].
    pub fn with_default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    pub fn default_wait(&self) -> Duration {
        self.default_wait
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append a task to the tail. Transport errors are returned as-is.
    pub async fn enqueue(&self, task: &Task) -> Result<(), QueueError> {
        let record = task.encode()?;
        self.store.rpush(&self.key, &record).await?;
        info!(
            task_id = %task.id,
            kind = %task.kind,
            guild = %task.guild_id,
            "Task enqueued"
        );
        Ok(())
    }

    /// Pop the head, waiting up to `timeout`. `Ok(None)` means the wait
    /// elapsed with nothing to do.
    ///
    /// A record that fails to decode has already been removed from the list;
    /// the error carries the raw text so the caller can requeue or drop it.
    pub async fn dequeue(&self, timeout: Duration) -> Result<Option<Task>, QueueError> {
        let Some(raw) = self.store.blpop(&self.key, timeout).await? else {
            return Ok(None);
        };
        let task = Task::decode(&raw)?;
        debug!(task_id = %task.id, kind = %task.kind, "Task dequeued");
        Ok(Some(task))
    }

    /// [`Self::dequeue`] with the configured default wait.
    pub async fn dequeue_default(&self) -> Result<Option<Task>, QueueError> {
        self.dequeue(self.default_wait).await
    }

    /// Push a raw record back, e.g. after a decode failure the caller wants
    /// to inspect later.
    pub async fn requeue_raw(&self, raw: &str) -> Result<(), QueueError> {
        self.store.rpush(&self.key, raw).await?;
        Ok(())
    }

    /// Number of tasks waiting.
    pub async fn len(&self) -> Result<usize, QueueError> {
        Ok(self.store.llen(&self.key).await?)
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::ids::GuildId;
    use crate::queue::{ONBOARDING_START, Scalar};
    use crate::store::{MemoryStore, Store};

    fn queue() -> (Arc<MemoryStore>, TaskQueue) {
        let store = Arc::new(MemoryStore::new());
        let queue = TaskQueue::new(store.clone(), "test");
        (store, queue)
    }

    #[tokio::test]
    async fn payload_survives_the_queue() {
        let (_, queue) = queue();
        let task = Task::new(ONBOARDING_START, GuildId::from("g1")).with("user_id", "U1");

        queue.enqueue(&task).await.unwrap();
        let popped = queue
            .dequeue(Duration::from_millis(100))
            .await
            .unwrap()
            .expect("task");

        assert_eq!(popped.payload, task.payload);
        assert_eq!(popped.payload["user_id"], Scalar::from("U1"));
        assert_eq!(popped, task);
    }

    #[tokio::test]
    async fn empty_queue_times_out_with_none() {
        let (_, queue) = queue();
        let started = Instant::now();

        let popped = queue.dequeue(Duration::from_millis(100)).await.unwrap();

        let waited = started.elapsed();
        assert!(popped.is_none());
        assert!(waited >= Duration::from_millis(90), "returned too early: {waited:?}");
        assert!(waited < Duration::from_secs(1), "waited too long: {waited:?}");
    }

    #[tokio::test]
    async fn default_wait_bounds_an_empty_dequeue() {
        let (_, queue) = queue();
        let queue = queue.with_default_wait(Duration::from_millis(60));
        let started = Instant::now();

        assert!(queue.dequeue_default().await.unwrap().is_none());

        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(50), "returned too early: {waited:?}");
        assert!(waited < Duration::from_secs(1), "waited too long: {waited:?}");
    }

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let (_, queue) = queue();
        let first = Task::new(ONBOARDING_START, GuildId::from("g1"));
        let second = Task::new(ONBOARDING_START, GuildId::from("g2"));
        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);

        let timeout = Duration::from_millis(10);
        assert_eq!(queue.dequeue(timeout).await.unwrap().unwrap().id, first.id);
        assert_eq!(queue.dequeue(timeout).await.unwrap().unwrap().id, second.id);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn duplicates_are_delivered_twice() {
        let (_, queue) = queue();
        let task = Task::new(ONBOARDING_START, GuildId::from("g1"));
        queue.enqueue(&task).await.unwrap();
        queue.enqueue(&task).await.unwrap();

        let timeout = Duration::from_millis(10);
        assert_eq!(queue.dequeue(timeout).await.unwrap().unwrap().id, task.id);
        assert_eq!(queue.dequeue(timeout).await.unwrap().unwrap().id, task.id);
    }

    #[tokio::test]
    async fn malformed_record_is_a_decode_error() {
        let (store, queue) = queue();
        store.rpush(queue.key(), "not json").await.unwrap();

        let raw = match queue.dequeue(Duration::from_millis(10)).await {
            Err(QueueError::Decode { raw, .. }) => raw,
            other => panic!("expected decode error, got {other:?}"),
        };
        assert_eq!(raw, "not json");

        // The caller decides what to do with it.
        queue.requeue_raw(&raw).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 1);
    }
}
