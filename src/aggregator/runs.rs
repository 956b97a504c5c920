//! Cross-run accumulation and window sealing.
//!
//! One `RunAggregator` exists per averaging profiler. The first run of a
//! window seeds the accumulated tree; each following run is merged node by
//! node into it. When the root has collected `target_run_count` samples the
//! window is sealed into an averaged [`ResultTree`] and the accumulator
//! resets, so consecutive windows never share a run.
//!
//! Merging is positional: two nodes correspond only when they sit at the same
//! depth under corresponding parents and agree on `(stage_name, order)`.
//! Anything unmatched is dropped from that run's contribution and reported;
//! a missing stage never counts as a zero-duration sample.

use log::warn;

use super::average::AverageTime;
use crate::profile::id::ProfilerId;
use crate::profile::stage::StageNode;
use crate::result::tree::ResultTree;
use crate::utils::error::AggregateError;

/// Accumulated counterpart of a `StageNode`: same tree position, statistics
/// instead of one run's times.
struct AvgNode {
    stage_name: String,
    order: u32,
    depth: usize,
    start_time: AverageTime,
    exec_time: AverageTime,
    children: Vec<AvgNode>,
}

impl AvgNode {
    /// Seeds an accumulator subtree from the window's first run
    fn seed(run: StageNode) -> Self {
        let StageNode {
            stage_name,
            order,
            depth,
            start_time_nanos,
            exec_time_nanos,
            children,
        } = run;
        Self {
            stage_name,
            order,
            depth,
            start_time: AverageTime::from_sample(start_time_nanos),
            exec_time: AverageTime::from_sample(exec_time_nanos),
            children: children.into_iter().map(AvgNode::seed).collect(),
        }
    }

    fn into_result(self) -> ResultTree {
        let children = self
            .children
            .into_iter()
            .map(AvgNode::into_result)
            .collect();
        if self.depth == 0 {
            ResultTree::RootAverage {
                stage_name: self.stage_name,
                exec_time: self.exec_time,
                children,
            }
        } else {
            ResultTree::Average {
                stage_name: self.stage_name,
                depth: self.depth,
                start_time: self.start_time,
                exec_time: self.exec_time,
                children,
            }
        }
    }
}

/// Accumulates finished runs until a window's worth has been collected.
pub(crate) struct RunAggregator {
    profiler_name: String,
    target_run_count: u32,
    window: Option<AvgNode>,
}

impl RunAggregator {
    pub(crate) fn new(profiler_id: &ProfilerId) -> Self {
        Self {
            profiler_name: profiler_id.name.clone(),
            target_run_count: profiler_id.target_run_count,
            window: None,
        }
    }

    /// Folds one finished run into the open window.
    ///
    /// Returns the sealed averaged tree when this run completes the window.
    pub(crate) fn add_run(&mut self, run: StageNode) -> Option<ResultTree> {
        match self.window.as_mut() {
            None => {
                self.window = Some(AvgNode::seed(run));
            }
            Some(acc) => {
                if acc.stage_name != run.stage_name || acc.order != run.order {
                    warn!(
                        "{}",
                        AggregateError::RootMismatch {
                            profiler: self.profiler_name.clone(),
                            expected: acc.stage_name.clone(),
                            got: run.stage_name,
                        }
                    );
                    return None;
                }
                Self::merge(&self.profiler_name, acc, &run);
            }
        }

        let sealed = self
            .window
            .as_ref()
            .map(|acc| acc.exec_time.measurement_counter >= self.target_run_count)
            .unwrap_or(false);
        if sealed {
            self.window.take().map(AvgNode::into_result)
        } else {
            None
        }
    }

    fn merge(profiler: &str, acc: &mut AvgNode, run: &StageNode) {
        acc.start_time.record(run.start_time_nanos);
        acc.exec_time.record(run.exec_time_nanos);

        // Pair children greedily: each run child takes the first window
        // child with the same (order, name) that no earlier child claimed.
        let mut claimed = vec![false; acc.children.len()];
        for run_child in &run.children {
            let slot = (0..acc.children.len()).find(|&i| {
                !claimed[i]
                    && acc.children[i].order == run_child.order
                    && acc.children[i].stage_name == run_child.stage_name
            });
            match slot {
                Some(i) => {
                    claimed[i] = true;
                    Self::merge(profiler, &mut acc.children[i], run_child);
                }
                None => {
                    warn!(
                        "{}",
                        AggregateError::UnmatchedNode {
                            profiler: profiler.to_string(),
                            stage: run_child.stage_name.clone(),
                            order: run_child.order,
                        }
                    );
                }
            }
        }
        for (i, acc_child) in acc.children.iter().enumerate() {
            if !claimed[i] {
                warn!(
                    "{}",
                    AggregateError::UnmatchedNode {
                        profiler: profiler.to_string(),
                        stage: acc_child.stage_name.clone(),
                        order: acc_child.order,
                    }
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn averaged(name: &str, runs: u32) -> RunAggregator {
        RunAggregator::new(&ProfilerId::new(name, runs))
    }

    fn leaf(name: &str, order: u32, start: u64, exec: u64) -> StageNode {
        let mut node = StageNode::open(name, order, 1, start);
        node.seal(start + exec);
        node
    }

    fn run(exec: u64, children: Vec<StageNode>) -> StageNode {
        let mut root = StageNode::open("load", 0, 0, 0);
        root.children = children;
        root.seal(exec);
        root
    }

    fn expect_root_average(tree: ResultTree) -> (AverageTime, Vec<ResultTree>) {
        match tree {
            ResultTree::RootAverage {
                exec_time,
                children,
                ..
            } => (exec_time, children),
            other => panic!("expected averaged root, got {other:?}"),
        }
    }

    #[test]
    fn test_window_seals_after_target_runs_with_exact_statistics() {
        let mut agg = averaged("load", 3);
        assert!(agg
            .add_run(run(10, vec![leaf("parse", 0, 2, 5)]))
            .is_none());
        assert!(agg
            .add_run(run(20, vec![leaf("parse", 0, 4, 7)]))
            .is_none());
        let sealed = agg
            .add_run(run(30, vec![leaf("parse", 0, 6, 9)]))
            .unwrap();

        let (exec, children) = expect_root_average(sealed);
        assert_eq!(exec.measurement_counter, 3);
        assert_eq!(exec.min_nanos, 10);
        assert_eq!(exec.max_nanos, 30);
        assert_eq!(exec.average_nanos, 20.0);

        match &children[0] {
            ResultTree::Average {
                stage_name,
                depth,
                start_time,
                exec_time,
                ..
            } => {
                assert_eq!(stage_name, "parse");
                assert_eq!(*depth, 1);
                assert_eq!(start_time.measurement_counter, 3);
                assert_eq!(start_time.average_nanos, 4.0);
                assert_eq!(exec_time.min_nanos, 5);
                assert_eq!(exec_time.max_nanos, 9);
                assert_eq!(exec_time.average_nanos, 7.0);
            }
            other => panic!("expected averaged child, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_stage_is_dropped_not_zeroed() {
        let mut agg = averaged("load", 2);
        agg.add_run(run(
            10,
            vec![leaf("parse", 0, 1, 2), leaf("render", 1, 4, 3)],
        ));
        let sealed = agg.add_run(run(12, vec![leaf("parse", 0, 1, 4)])).unwrap();

        let (exec, children) = expect_root_average(sealed);
        assert_eq!(exec.measurement_counter, 2);
        assert_eq!(children.len(), 2);

        // "parse" saw both runs, "render" only the first. A zero sample for
        // the missing run would have dragged its minimum to 0.
        match (&children[0], &children[1]) {
            (
                ResultTree::Average {
                    stage_name: parse,
                    exec_time: parse_exec,
                    ..
                },
                ResultTree::Average {
                    stage_name: render,
                    exec_time: render_exec,
                    ..
                },
            ) => {
                assert_eq!(parse, "parse");
                assert_eq!(parse_exec.measurement_counter, 2);
                assert_eq!(render, "render");
                assert_eq!(render_exec.measurement_counter, 1);
                assert_eq!(render_exec.min_nanos, 3);
            }
            other => panic!("expected two averaged children, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_root_contributes_nothing() {
        let mut agg = averaged("load", 2);
        assert!(agg.add_run(run(10, vec![])).is_none());

        let mut stray = StageNode::open("save", 0, 0, 0);
        stray.seal(99);
        assert!(agg.add_run(stray).is_none());

        let sealed = agg.add_run(run(20, vec![])).unwrap();
        let (exec, _) = expect_root_average(sealed);
        assert_eq!(exec.measurement_counter, 2);
        assert_eq!(exec.max_nanos, 20);
    }

    #[test]
    fn test_consecutive_windows_never_share_runs() {
        let mut agg = averaged("load", 2);
        assert!(agg.add_run(run(10, vec![])).is_none());
        let first = agg.add_run(run(20, vec![])).unwrap();
        assert!(agg.add_run(run(100, vec![])).is_none());
        let second = agg.add_run(run(200, vec![])).unwrap();

        let (first_exec, _) = expect_root_average(first);
        let (second_exec, _) = expect_root_average(second);
        assert_eq!(first_exec.measurement_counter, 2);
        assert_eq!(first_exec.max_nanos, 20);
        assert_eq!(second_exec.measurement_counter, 2);
        assert_eq!(second_exec.min_nanos, 100);
    }

    #[test]
    fn test_equal_orders_pair_off_by_arrival() {
        let mut agg = averaged("load", 2);
        agg.add_run(run(10, vec![leaf("read", 0, 0, 1), leaf("read", 0, 2, 3)]));
        let sealed = agg
            .add_run(run(10, vec![leaf("read", 0, 0, 5), leaf("read", 0, 2, 7)]))
            .unwrap();

        let (_, children) = expect_root_average(sealed);
        match (&children[0], &children[1]) {
            (
                ResultTree::Average {
                    exec_time: first, ..
                },
                ResultTree::Average {
                    exec_time: second, ..
                },
            ) => {
                assert_eq!((first.min_nanos, first.max_nanos), (1, 5));
                assert_eq!((second.min_nanos, second.max_nanos), (3, 7));
            }
            other => panic!("expected two averaged children, got {other:?}"),
        }
    }
}
