//! End-of-scope liveness sweep.
//!
//! Triggered when the host signals that symbols died at the current path
//! position. Entries rooted at a dead symbol are evicted from both stores;
//! the ones still in a must-still-be-terminated state are reported as
//! missing-termination findings first. Each family accumulates at most one
//! diagnostic branch node per sweep, shared by all of its leaks, so a
//! scope exit with many dead handles does not blow up the path graph.

use vigil_ir::store::ProgramState;

use crate::host::{ExplorationHost, NodeId, SymbolReaper};
use crate::report::BugReport;

/// Run the sweep over the current store snapshot and return the swept
/// state. Cheap no-op when nothing died or nothing is tracked.
pub fn run<H: ExplorationHost>(
    state: &ProgramState,
    reaper: &SymbolReaper,
    host: &mut H,
) -> ProgramState {
    if !reaper.has_dead_symbols() {
        return state.clone();
    }
    if state.requests.is_empty() && state.files.is_empty() {
        return state.clone();
    }

    let mut next = state.clone();

    let mut request_anchor: Option<NodeId> = None;
    for (handle, request) in state.requests.iter() {
        if reaper.is_live(handle.symbol()) {
            continue;
        }
        if request.needs_termination() {
            let node = *request_anchor
                .get_or_insert_with(|| host.generate_diagnostic_branch(state, "missing-wait"));
            host.emit_report(BugReport::missing_wait(handle, node));
        }
        next = next.without_request(handle);
    }

    let mut file_anchor: Option<NodeId> = None;
    for (handle, file) in state.files.iter() {
        if reaper.is_live(handle.symbol()) {
            continue;
        }
        if file.needs_termination() {
            let node = *file_anchor
                .get_or_insert_with(|| host.generate_diagnostic_branch(state, "file-leak"));
            host.emit_report(BugReport::file_leak(handle, node));
        }
        next = next.without_file(handle);
    }

    let anchor = file_anchor.or(request_anchor);
    if anchor.is_some() || next != *state {
        host.add_transition(next.clone(), anchor, None);
    }
    next
}
