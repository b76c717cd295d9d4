//! Reference path explorer.
//!
//! The real host owns the control-flow graph, the symbolic execution, and
//! the path-state merging. This module provides the minimal counterpart
//! the checker contract needs: an append-only node graph recording one
//! state snapshot per transition, a cursor with `mark`/`resume` for path
//! forking, and visitor replay over the recorded path. It drives the
//! checker in the test suites and serves as the executable description of
//! the host protocol.
//!
//! No merging happens here: branches forked from the same node each see
//! the pre-fork store version and diverge independently, and the checker
//! runs on each branch separately.

use indexmap::IndexMap;
use vigil_ir::location::{MemLocation, SourceRange, SymbolId};
use vigil_ir::store::ProgramState;

use crate::checker::LifecycleChecker;
use crate::host::{CallEvent, ExplorationHost, NodeId, SymbolReaper};
use crate::report::BugReport;
use crate::visitor::{PathEvent, PathView};

/// One node of the explored path.
#[derive(Debug, Clone)]
pub struct PathNode {
    pub pred: Option<NodeId>,
    pub state: ProgramState,
    /// Source range of the event that produced this node, when it was a
    /// call.
    pub range: Option<SourceRange>,
    /// Tag of the diagnostic branch this node anchors, if any.
    pub tag: Option<String>,
}

/// Append-only graph of explored path nodes. Forks are represented by two
/// nodes sharing a predecessor; there are no join nodes.
#[derive(Debug, Default)]
pub struct ExplorationGraph {
    nodes: Vec<PathNode>,
}

impl ExplorationGraph {
    fn push(&mut self, node: PathNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &PathNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl PathView for ExplorationGraph {
    fn pred(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].pred
    }

    fn state(&self, node: NodeId) -> &ProgramState {
        &self.nodes[node].state
    }

    fn range(&self, node: NodeId) -> Option<SourceRange> {
        self.nodes[node].range
    }
}

/// The mutable exploration surface handed to the checker.
#[derive(Debug, Default)]
struct Frontier {
    graph: ExplorationGraph,
    current: NodeId,
    reports: Vec<BugReport>,
    extents: IndexMap<SymbolId, u64>,
}

impl ExplorationHost for Frontier {
    fn generate_diagnostic_branch(&mut self, state: &ProgramState, tag: &str) -> NodeId {
        let id = self.graph.push(PathNode {
            pred: Some(self.current),
            state: state.clone(),
            range: None,
            tag: Some(tag.to_owned()),
        });
        self.current = id;
        id
    }

    fn add_transition(
        &mut self,
        state: ProgramState,
        anchor: Option<NodeId>,
        range: Option<SourceRange>,
    ) {
        let pred = anchor.unwrap_or(self.current);
        let id = self.graph.push(PathNode {
            pred: Some(pred),
            state,
            range,
            tag: None,
        });
        self.current = id;
    }

    fn emit_report(&mut self, report: BugReport) {
        self.reports.push(report);
    }

    fn concrete_bound(&self, _state: &ProgramState, location: &MemLocation) -> Option<u64> {
        self.extents.get(&location.symbol).copied()
    }
}

/// Drives a [`LifecycleChecker`] along explicitly scripted paths.
pub struct PathExplorer {
    checker: LifecycleChecker,
    frontier: Frontier,
}

impl PathExplorer {
    pub fn new(checker: LifecycleChecker) -> Self {
        let mut frontier = Frontier::default();
        frontier.graph.push(PathNode {
            pred: None,
            state: ProgramState::new(),
            range: None,
            tag: None,
        });
        PathExplorer { checker, frontier }
    }

    /// Declare the statically known element count of the aggregate rooted
    /// at `symbol`, backing the concrete-bound query for multi-waits.
    pub fn declare_extent(&mut self, symbol: SymbolId, elements: u64) {
        self.frontier.extents.insert(symbol, elements);
    }

    /// Current path position.
    pub fn mark(&self) -> NodeId {
        self.frontier.current
    }

    /// Continue exploration from an earlier position; the states recorded
    /// since are left untouched on their own branch.
    pub fn resume(&mut self, node: NodeId) {
        debug_assert!(node < self.frontier.graph.len());
        self.frontier.current = node;
    }

    /// Lifecycle state at the current path position.
    pub fn state(&self) -> &ProgramState {
        &self.frontier.graph.node(self.frontier.current).state
    }

    /// Feed one call event through the checker.
    pub fn step_call(&mut self, call: &CallEvent) {
        let state = self.state().clone();
        self.checker.on_call(&state, call, &mut self.frontier);
    }

    /// Signal that the given symbols died at the current position.
    pub fn step_symbol_death(&mut self, dead: impl IntoIterator<Item = SymbolId>) {
        let reaper = SymbolReaper::new(dead);
        let state = self.state().clone();
        self.checker.on_symbol_death(&state, &reaper, &mut self.frontier);
    }

    pub fn reports(&self) -> &[BugReport] {
        &self.frontier.reports
    }

    pub fn graph(&self) -> &ExplorationGraph {
        &self.frontier.graph
    }

    /// Replay a report's backward-search visitor against the explored
    /// path, yielding its secondary "previously here" location.
    pub fn resolve_secondary(&self, report: &BugReport) -> Option<PathEvent> {
        report
            .visitor
            .as_ref()
            .and_then(|visitor| visitor.run(&self.frontier.graph, report.node))
    }
}
