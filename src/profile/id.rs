//! Identity types for profilers and stages.
//!
//! A `ProfilerId` names one logical operation being profiled and carries the
//! averaging policy; a `StageId` names one stage inside it. Both are plain
//! value types: equality over all fields, cheap to clone, and the registry
//! keys its live state on `ProfilerId`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one logical profiled operation.
///
/// Two ids with the same name but different `target_run_count` are distinct
/// profilers with independent state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfilerId {
    /// Human-readable operation name, shown in results and diagnostics
    pub name: String,

    /// Number of runs folded into one averaged result.
    /// `0` and `1` both mean every run is delivered individually.
    pub target_run_count: u32,
}

impl ProfilerId {
    pub fn new(name: impl Into<String>, target_run_count: u32) -> Self {
        Self {
            name: name.into(),
            target_run_count,
        }
    }

    /// Shorthand for a profiler that emits every run individually
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }

    /// True when results are accumulated across runs before delivery
    pub fn is_averaging(&self) -> bool {
        self.target_run_count > 1
    }
}

impl fmt::Display for ProfilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Identity of one stage within a profiler.
///
/// `order` positions the stage among its siblings and aligns it with the same
/// stage in other runs; it never carries timing meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageId {
    pub profiler_id: ProfilerId,
    pub stage_name: String,
    pub order: u32,
}

impl StageId {
    pub fn new(profiler_id: ProfilerId, stage_name: impl Into<String>, order: u32) -> Self {
        Self {
            profiler_id,
            stage_name: stage_name.into(),
            order,
        }
    }
}
