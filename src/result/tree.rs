//! Immutable result trees delivered to handlers.
//!
//! A delivered result is one of exactly four shapes: a single run's root or
//! nested stage, or an averaged window's root or nested stage. Consumers
//! match on the variant; adding a shape is a deliberate breaking change, not
//! something handlers discover at runtime.

use serde::{Deserialize, Serialize};

use crate::aggregator::average::AverageTime;
use crate::profile::stage::StageNode;

/// One node of a delivered timing tree.
///
/// Roots carry no start time (a run starts at 0 by construction) and no
/// depth (always 0). All durations are nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultTree {
    /// Root of a single run
    RootSingle {
        stage_name: String,
        exec_time_nanos: u64,
        children: Vec<ResultTree>,
    },

    /// Nested stage of a single run
    Single {
        stage_name: String,
        depth: usize,
        start_time_nanos: u64,
        exec_time_nanos: u64,
        children: Vec<ResultTree>,
    },

    /// Root of an averaged window
    RootAverage {
        stage_name: String,
        exec_time: AverageTime,
        children: Vec<ResultTree>,
    },

    /// Nested stage of an averaged window
    Average {
        stage_name: String,
        depth: usize,
        start_time: AverageTime,
        exec_time: AverageTime,
        children: Vec<ResultTree>,
    },
}

impl ResultTree {
    pub fn stage_name(&self) -> &str {
        match self {
            ResultTree::RootSingle { stage_name, .. }
            | ResultTree::Single { stage_name, .. }
            | ResultTree::RootAverage { stage_name, .. }
            | ResultTree::Average { stage_name, .. } => stage_name,
        }
    }

    pub fn children(&self) -> &[ResultTree] {
        match self {
            ResultTree::RootSingle { children, .. }
            | ResultTree::Single { children, .. }
            | ResultTree::RootAverage { children, .. }
            | ResultTree::Average { children, .. } => children,
        }
    }

    /// Nesting level; roots are 0
    pub fn depth(&self) -> usize {
        match self {
            ResultTree::RootSingle { .. } | ResultTree::RootAverage { .. } => 0,
            ResultTree::Single { depth, .. } | ResultTree::Average { depth, .. } => *depth,
        }
    }

    /// True for the two averaged-window shapes
    pub fn is_averaged(&self) -> bool {
        matches!(
            self,
            ResultTree::RootAverage { .. } | ResultTree::Average { .. }
        )
    }

    /// Converts a finished run into the single-run shapes
    pub(crate) fn from_single_run(node: StageNode) -> Self {
        let StageNode {
            stage_name,
            depth,
            start_time_nanos,
            exec_time_nanos,
            children,
            ..
        } = node;
        let children = children.into_iter().map(Self::from_single_run).collect();
        if depth == 0 {
            ResultTree::RootSingle {
                stage_name,
                exec_time_nanos,
                children,
            }
        } else {
            ResultTree::Single {
                stage_name,
                depth,
                start_time_nanos,
                exec_time_nanos,
                children,
            }
        }
    }
}
