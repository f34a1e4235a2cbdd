//! Worker pool state shared with the worker processes.

pub mod status;

pub use status::{StatusRegistry, WorkerStatus};
