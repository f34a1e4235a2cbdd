//! Station bot: event routing and onboarding worker coordination.

pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod gateway;
pub mod ids;
pub mod onboarding;
pub mod queue;
pub mod routing;
pub mod store;
pub mod workers;
