//! Bot features and the registry that dispatches to them.

pub mod builtin;
pub mod feature;
pub mod registry;

pub use builtin::OnboardingFeature;
pub use feature::{Dispatch, EventKind, Feature};
pub use registry::FeatureRegistry;
