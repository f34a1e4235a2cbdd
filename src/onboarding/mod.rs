//! Onboarding coordination: sessions and worker assignment.
//!
//! A new member is walked through a sequence of voice-channel stations by
//! one of a small pool of worker processes. This module owns the hand-off:
//! who is being onboarded, by which worker, and the task that tells the
//! worker to begin. The station walk itself runs in the worker.

pub mod coordinator;
pub mod session;

pub use coordinator::{Assignment, OnboardingCoordinator};
pub use session::{OnboardingSession, SESSION_LEASE, SessionStore};
