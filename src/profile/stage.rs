//! Per-run stage tree nodes.
//!
//! `StageNode` is the transient shape a run lives in while its begin/end
//! stream is still arriving. All times are nanoseconds relative to the run
//! root's start, so a root node always starts at 0. Once the root is sealed
//! the whole tree is converted into an immutable [`crate::ResultTree`].

/// One stage of one run: timing plus ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StageNode {
    pub(crate) stage_name: String,
    pub(crate) order: u32,
    /// Root is 0, each nesting level adds 1
    pub(crate) depth: usize,
    pub(crate) start_time_nanos: u64,
    pub(crate) exec_time_nanos: u64,
    pub(crate) children: Vec<StageNode>,
}

impl StageNode {
    /// Opens a stage at `start_time_nanos` with no duration yet
    pub(crate) fn open(
        stage_name: impl Into<String>,
        order: u32,
        depth: usize,
        start_time_nanos: u64,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            order,
            depth,
            start_time_nanos,
            exec_time_nanos: 0,
            children: Vec::new(),
        }
    }

    /// Fixes the duration as of `now_nanos`. Clock skew can make `now` lag
    /// the recorded start; saturate instead of wrapping.
    pub(crate) fn seal(&mut self, now_nanos: u64) {
        self.exec_time_nanos = now_nanos.saturating_sub(self.start_time_nanos);
    }

    /// True if a sealed child already claimed this sibling order
    pub(crate) fn has_child_order(&self, order: u32) -> bool {
        self.children.iter().any(|c| c.order == order)
    }

    /// Attaches a sealed child, keeping children sorted by order ascending.
    /// Equal orders keep arrival order: the newcomer goes after them.
    pub(crate) fn insert_child(&mut self, child: StageNode) {
        let at = self.children.partition_point(|c| c.order <= child.order);
        self.children.insert(at, child);
    }
}
