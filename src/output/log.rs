//! Human-readable result logging.
//!
//! Renders a delivered tree as one multi-line `info!` message. Every stage
//! prints an opening and a closing line joined by arrows, indented two spaces
//! per depth level, with durations in milliseconds:
//!
//! ```text
//! Profiling results for load:
//! load --> 0ms
//!   parse --> 10ms
//!   parse <-- 30ms, execution = 20ms
//! load <-- 50ms
//! ```
//!
//! Averaged shapes replace the plain numbers with their statistics
//! (`avg = 20.50ms, min = 18ms, max = 23ms, for 3 runs`).

use log::info;

use crate::aggregator::average::AverageTime;
use crate::profile::id::ProfilerId;
use crate::result::handler::ResultHandler;
use crate::result::tree::ResultTree;
use crate::utils::config::NANOS_PER_MS;

const RIGHT_ARROW: &str = " --> ";
const LEFT_ARROW: &str = " <-- ";
const DEPTH_PREFIX: &str = "  ";

/// Logs every delivered result through `log::info!`.
pub struct LogResultHandler;

impl ResultHandler for LogResultHandler {
    fn handle_result(&self, result: &ResultTree, profiler_id: &ProfilerId) {
        info!("{}", render(result, profiler_id));
    }
}

/// Renders a result tree to the text layout shown in the module docs
pub fn render(result: &ResultTree, profiler_id: &ProfilerId) -> String {
    let mut message = String::from("Profiling results");
    if !profiler_id.name.is_empty() {
        message.push_str(" for ");
        message.push_str(&profiler_id.name);
    }
    message.push_str(":\n");
    render_node(result, &mut message);
    message
}

fn render_node(node: &ResultTree, out: &mut String) {
    match node {
        ResultTree::RootSingle {
            stage_name,
            exec_time_nanos,
            children,
        } => {
            out.push_str(stage_name);
            out.push_str(RIGHT_ARROW);
            out.push_str("0ms\n");
            render_children(children, out);
            out.push_str(stage_name);
            out.push_str(LEFT_ARROW);
            out.push_str(&format!("{}ms", exec_time_nanos / NANOS_PER_MS));
        }
        ResultTree::Single {
            stage_name,
            depth,
            start_time_nanos,
            exec_time_nanos,
            children,
        } => {
            push_indent(out, *depth);
            out.push_str(stage_name);
            out.push_str(RIGHT_ARROW);
            out.push_str(&format!("{}ms\n", start_time_nanos / NANOS_PER_MS));
            render_children(children, out);
            push_indent(out, *depth);
            out.push_str(stage_name);
            out.push_str(LEFT_ARROW);
            out.push_str(&format!(
                "{}ms, execution = {}ms",
                (start_time_nanos + exec_time_nanos) / NANOS_PER_MS,
                exec_time_nanos / NANOS_PER_MS
            ));
        }
        ResultTree::RootAverage {
            stage_name,
            exec_time,
            children,
        } => {
            out.push_str(stage_name);
            out.push_str(RIGHT_ARROW);
            out.push_str("0ms\n");
            render_children(children, out);
            out.push_str(stage_name);
            out.push_str(LEFT_ARROW);
            push_average(out, exec_time);
        }
        ResultTree::Average {
            stage_name,
            depth,
            start_time,
            exec_time,
            children,
        } => {
            push_indent(out, *depth);
            out.push_str(stage_name);
            out.push_str(RIGHT_ARROW);
            push_average(out, start_time);
            out.push('\n');
            render_children(children, out);
            push_indent(out, *depth);
            out.push_str(stage_name);
            out.push_str(LEFT_ARROW);
            push_average(out, exec_time);
        }
    }
}

fn render_children(children: &[ResultTree], out: &mut String) {
    for child in children {
        render_node(child, out);
        out.push('\n');
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(DEPTH_PREFIX);
    }
}

fn push_average(out: &mut String, time: &AverageTime) {
    out.push_str(&format!(
        "avg = {:.2}ms, min = {}ms, max = {}ms, for {} runs",
        time.average_nanos / NANOS_PER_MS as f64,
        time.min_nanos / NANOS_PER_MS,
        time.max_nanos / NANOS_PER_MS,
        time.measurement_counter
    ));
}
