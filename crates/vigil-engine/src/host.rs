//! The interface between the checker and the host path-exploration engine.
//!
//! The host owns the control-flow graph and the symbolic execution; the
//! checker is a synchronous callback driven through [`ExplorationHost`].
//! Every checker entry point is a total function of the incoming state and
//! the event: it hands the host a continuation state and zero or more
//! reports, and never terminates exploration itself.

use indexmap::IndexSet;
use vigil_ir::location::{MemLocation, SourceRange, SymbolId};
use vigil_ir::store::ProgramState;

use crate::report::BugReport;

/// Identifier of one node in the host's explored path.
pub type NodeId = usize;

/// A call observed by the host during path exploration, with each argument
/// already evaluated as a handle candidate. `None` entries are arguments
/// the host could not resolve to a memory location (literals, temporaries,
/// opaque expressions); the checker skips them silently.
#[derive(Debug, Clone)]
pub struct CallEvent {
    /// Callee identifier, fed to the classifier.
    pub callee: String,
    pub args: Vec<Option<MemLocation>>,
    /// Source range of the call expression.
    pub range: SourceRange,
}

impl CallEvent {
    pub fn new(
        callee: impl Into<String>,
        args: Vec<Option<MemLocation>>,
        range: SourceRange,
    ) -> Self {
        CallEvent {
            callee: callee.into(),
            args,
            range,
        }
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    /// The handle candidate at `index`, if the host resolved one.
    pub fn handle_candidate(&self, index: usize) -> Option<&MemLocation> {
        self.args.get(index).and_then(Option::as_ref)
    }
}

/// The set of symbols the host has declared dead at the current path
/// position. Liveness is rooted: a handle is dead iff its root symbol is.
#[derive(Debug, Clone, Default)]
pub struct SymbolReaper {
    dead: IndexSet<SymbolId>,
}

impl SymbolReaper {
    pub fn new(dead: impl IntoIterator<Item = SymbolId>) -> Self {
        SymbolReaper {
            dead: dead.into_iter().collect(),
        }
    }

    pub fn has_dead_symbols(&self) -> bool {
        !self.dead.is_empty()
    }

    pub fn is_live(&self, symbol: SymbolId) -> bool {
        !self.dead.contains(&symbol)
    }
}

/// Services the checker consumes from the host exploration engine.
pub trait ExplorationHost {
    /// Create one exploration node anchoring diagnostics at the current
    /// path position without forking real control flow. All violations
    /// found at one call or one sweep share such a node.
    fn generate_diagnostic_branch(&mut self, state: &ProgramState, tag: &str) -> NodeId;

    /// Record the post-event state as the path continuation. `anchor` is a
    /// previously generated diagnostic branch node when the event produced
    /// reports; `range` is the triggering event's source range.
    fn add_transition(
        &mut self,
        state: ProgramState,
        anchor: Option<NodeId>,
        range: Option<SourceRange>,
    );

    /// Hand a completed diagnostic to the host's output surface.
    fn emit_report(&mut self, report: BugReport);

    /// Statically known element count of the aggregate rooted at
    /// `location`'s symbol, or `None` when the bound is not concrete in
    /// `state`. Consulted only for multi-handle waits over arrays.
    fn concrete_bound(&self, state: &ProgramState, location: &MemLocation) -> Option<u64>;
}
