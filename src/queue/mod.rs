//! Task queue for onboarding work.

pub mod task;
pub mod task_queue;

pub use task::{ONBOARDING_START, Scalar, Task};
pub use task_queue::{DEFAULT_DEQUEUE_WAIT, TaskQueue};
