//! `Store` trait: the shared key/value and list transport.
//!
//! The queue, the status registry and the session store all sit on top of
//! this. It covers the subset of Redis semantics the bot needs, and the
//! in-memory backend mirrors it exactly.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend-agnostic shared store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read a live value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value with an expiry, replacing any previous value.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Write a value with an expiry only if no live value exists.
    /// Returns whether the write happened.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Overwrite a live value without touching its expiry.
    /// Returns `false` (and writes nothing) if the key is absent.
    async fn set_keep_ttl(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Whether a live value exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Append to the tail of a list.
    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Pop the head of a list, waiting up to `timeout` for an element.
    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError>;

    /// Length of a list (zero when absent).
    async fn llen(&self, key: &str) -> Result<usize, StoreError>;

    /// Health check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
