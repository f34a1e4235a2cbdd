//! Indexed routing for message and voice events.

pub mod handler;
pub mod router;

pub use handler::{EventHandler, FnHandler, Handler, handler_fn};
pub use router::{EventRouter, IndexedKind};
