//! Error types for station-bot.

use crate::ids::{GuildId, UserId};

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Shared key/value transport errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store command {command} failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Task queue errors.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue transport failed: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode task: {0}")]
    Encode(String),

    /// A record came off the queue but could not be decoded. The raw text is
    /// kept so the caller can requeue or discard it.
    #[error("Failed to decode task record: {reason}")]
    Decode { reason: String, raw: String },
}

/// Onboarding coordination errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Onboarding already active for user {user} in guild {guild}")]
    AlreadyActive { guild: GuildId, user: UserId },

    #[error("No worker available")]
    NoWorkerAvailable,

    #[error("No onboarding session for user {user} in guild {guild}")]
    SessionNotFound { guild: GuildId, user: UserId },

    #[error("Malformed session record: {0}")]
    Session(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by feature handlers.
///
/// "Not my event" is not an error; see [`crate::features::Dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Feature {feature} failed: {reason}")]
    Failed { feature: String, reason: String },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Feature registration errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Feature name must not be empty")]
    EmptyName,

    #[error("Feature {name} is already registered")]
    Duplicate { name: String },
}

/// Upstream event source errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
