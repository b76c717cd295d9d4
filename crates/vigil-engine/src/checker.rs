//! The protocol transition engine.
//!
//! One [`LifecycleChecker`] is created per analysis unit and driven by the
//! host at every call site and symbol-death event during path exploration.
//! Each entry point filters on the classifier, resolves the designated
//! handle(s), computes the successor lifecycle state, and reports any
//! violation through the host — then always hands back a continuation
//! state, since findings are never fatal to exploration.

use std::sync::Arc;

use tracing::debug;
use vigil_ir::handle::Handle;
use vigil_ir::location::{LocationKind, MemLocation};
use vigil_ir::state::{FileState, RequestState};
use vigil_ir::store::ProgramState;

use crate::classifier::{CallClassifier, OperationKind};
use crate::host::{CallEvent, ExplorationHost, NodeId, SymbolReaper};
use crate::report::BugReport;
use crate::sweep;

pub struct LifecycleChecker {
    classifier: Arc<CallClassifier>,
}

impl LifecycleChecker {
    pub fn new(classifier: Arc<CallClassifier>) -> Self {
        LifecycleChecker { classifier }
    }

    pub fn classifier(&self) -> &CallClassifier {
        &self.classifier
    }

    /// Dispatch one call event through every detection entry point. Each
    /// entry point filters on its own operation kind, so at most one of
    /// them transitions; unclassified calls pass through untouched.
    pub fn on_call<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        call: &CallEvent,
        host: &mut H,
    ) -> ProgramState {
        match self.classifier.classify(&call.callee) {
            Some(OperationKind::Nonblocking) => self.on_nonblocking_call(state, call, host),
            Some(OperationKind::Wait) | Some(OperationKind::WaitAll) => {
                self.on_wait_call(state, call, host)
            }
            Some(OperationKind::FileOpen) => self.on_open_call(state, call, host),
            Some(OperationKind::FileClose) => self.on_close_call(state, call, host),
            None => state.clone(),
        }
    }

    /// A classified nonblocking call: set the handle to `Nonblocking`,
    /// reporting a double nonblocking when it already is.
    pub fn on_nonblocking_call<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        call: &CallEvent,
        host: &mut H,
    ) -> ProgramState {
        if self.classifier.classify(&call.callee) != Some(OperationKind::Nonblocking) {
            return state.clone();
        }
        let Some(handle) = self.designated_handle(call, OperationKind::Nonblocking) else {
            return state.clone();
        };

        let mut anchor = None;
        if state.requests.get(&handle) == Some(&RequestState::Nonblocking) {
            let node = host.generate_diagnostic_branch(state, "double-nonblocking");
            host.emit_report(BugReport::double_nonblocking(&handle, call.range, node));
            anchor = Some(node);
        }

        // The state is overwritten even on the error path so the analysis
        // continues from a fresh request lifetime.
        let next = state.with_request(handle, RequestState::Nonblocking);
        host.add_transition(next.clone(), anchor, Some(call.range));
        next
    }

    /// A classified wait call: set every waited handle to `Wait`, reporting
    /// an unmatched wait for each one with no preceding nonblocking call.
    /// All violations of one wait call share a single diagnostic branch
    /// node.
    pub fn on_wait_call<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        call: &CallEvent,
        host: &mut H,
    ) -> ProgramState {
        let kind = match self.classifier.classify(&call.callee) {
            Some(kind @ (OperationKind::Wait | OperationKind::WaitAll)) => kind,
            _ => return state.clone(),
        };
        let Some(index) = kind.handle_argument(call.num_args()) else {
            return state.clone();
        };
        let Some(location) = call.handle_candidate(index) else {
            return state.clone();
        };
        let handles = self.waited_handles(state, location, kind, host);
        if handles.is_empty() {
            return state.clone();
        }

        let mut next = state.clone();
        let mut anchor: Option<NodeId> = None;
        for handle in handles {
            let known = next.requests.contains(&handle);
            next = next.with_request(handle.clone(), RequestState::Wait);
            if !known {
                let node = *anchor
                    .get_or_insert_with(|| host.generate_diagnostic_branch(state, "unmatched-wait"));
                host.emit_report(BugReport::unmatched_wait(&handle, call.range, node));
            }
        }

        host.add_transition(next.clone(), anchor, Some(call.range));
        next
    }

    /// A classified open call: set the handle to `Open`, reporting a double
    /// open when a still-open entry is about to be overwritten.
    pub fn on_open_call<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        call: &CallEvent,
        host: &mut H,
    ) -> ProgramState {
        if self.classifier.classify(&call.callee) != Some(OperationKind::FileOpen) {
            return state.clone();
        }
        let Some(handle) = self.designated_handle(call, OperationKind::FileOpen) else {
            return state.clone();
        };

        let mut anchor = None;
        if state.files.get(&handle) == Some(&FileState::Open) {
            let node = host.generate_diagnostic_branch(state, "double-open");
            host.emit_report(BugReport::double_open(&handle, call.range, node));
            anchor = Some(node);
        }

        let next = state.with_file(handle, FileState::Open);
        host.add_transition(next.clone(), anchor, Some(call.range));
        next
    }

    /// A classified close call: set the handle to `Close`, reporting a
    /// double close when it already is closed.
    pub fn on_close_call<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        call: &CallEvent,
        host: &mut H,
    ) -> ProgramState {
        if self.classifier.classify(&call.callee) != Some(OperationKind::FileClose) {
            return state.clone();
        }
        let Some(handle) = self.designated_handle(call, OperationKind::FileClose) else {
            return state.clone();
        };

        let mut anchor = None;
        if state.files.get(&handle) == Some(&FileState::Close) {
            let node = host.generate_diagnostic_branch(state, "double-close");
            host.emit_report(BugReport::double_close(&handle, call.range, node));
            anchor = Some(node);
        }

        let next = state.with_file(handle, FileState::Close);
        host.add_transition(next.clone(), anchor, Some(call.range));
        next
    }

    /// The host reported dead symbols: run the liveness sweep over both
    /// families, reporting missing terminations and evicting dead entries.
    pub fn on_symbol_death<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        reaper: &SymbolReaper,
        host: &mut H,
    ) -> ProgramState {
        sweep::run(state, reaper, host)
    }

    /// Resolve the designated handle argument of a call, skipping
    /// unresolvable or untyped candidates.
    fn designated_handle(&self, call: &CallEvent, kind: OperationKind) -> Option<Handle> {
        let index = kind.handle_argument(call.num_args())?;
        let location = call.handle_candidate(index)?;
        let handle = Handle::resolve(location);
        if handle.is_none() {
            debug!(callee = %call.callee, "skipping call: handle storage is not statically typed");
        }
        handle
    }

    /// The set of handles a wait call references. A single wait names one
    /// handle; a multi-wait over an array names one handle per element, up
    /// to the statically known bound. An unknown bound means the call
    /// cannot be analyzed and is skipped rather than guessed at.
    fn waited_handles<H: ExplorationHost>(
        &self,
        state: &ProgramState,
        location: &MemLocation,
        kind: OperationKind,
        host: &H,
    ) -> Vec<Handle> {
        let Some(handle) = Handle::resolve(location) else {
            debug!("skipping wait: handle storage is not statically typed");
            return Vec::new();
        };

        // A single request passed to a multi-wait is still one handle.
        if kind == OperationKind::Wait || matches!(location.kind, LocationKind::Variable) {
            return vec![handle];
        }

        match host.concrete_bound(state, location) {
            Some(bound) => (0..bound).map(|i| Handle::element(location, i)).collect(),
            None => {
                debug!(
                    array = %location.name,
                    "skipping multi-wait: array bound is not statically known"
                );
                Vec::new()
            }
        }
    }
}
