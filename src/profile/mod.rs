//! Live profiling state: identities, per-run tracking, and the registry.

pub mod id;
pub mod registry;
pub mod guard;
pub(crate) mod stage;
pub(crate) mod tracker;

// Re-export main types
pub use id::{ProfilerId, StageId};
pub use registry::ProfilerRegistry;
pub use guard::StageGuard;
