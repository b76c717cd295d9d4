//! Backward path-search visitor for diagnostic context.
//!
//! A report that references a prior event (double nonblocking, double open,
//! double close, missing wait, file leak) carries a small visitor object
//! instead of an eagerly computed location. When the host finally renders
//! the diagnostic path, the visitor walks backward from the violation node
//! and attaches a secondary location at the point where the relevant prior
//! state was established.

use serde::{Deserialize, Serialize};
use vigil_ir::handle::Handle;
use vigil_ir::location::SourceRange;
use vigil_ir::state::ProtocolFamily;
use vigil_ir::store::ProgramState;

use crate::host::NodeId;

/// Read access to an explored path, provided by whatever owns the node
/// graph when diagnostics are rendered.
pub trait PathView {
    fn pred(&self, node: NodeId) -> Option<NodeId>;
    fn state(&self, node: NodeId) -> &ProgramState;
    fn range(&self, node: NodeId) -> Option<SourceRange>;
}

/// A secondary diagnostic location found by replaying a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEvent {
    /// Node whose event established the prior state.
    pub node: NodeId,
    pub range: Option<SourceRange>,
    /// Explanatory label, e.g. "Request is previously used by nonblocking
    /// call here.".
    pub label: String,
}

/// Deferred backward search bound to one handle and one protocol family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeVisitor {
    pub family: ProtocolFamily,
    pub handle: Handle,
    pub label: String,
}

impl StateChangeVisitor {
    pub fn new(family: ProtocolFamily, handle: Handle, label: impl Into<String>) -> Self {
        StateChangeVisitor {
            family,
            handle,
            label: label.into(),
        }
    }

    /// Walk backward from `origin` along predecessor links and return the
    /// first node whose stored state for the handle differs from its
    /// predecessor's. That node's event is what established the state the
    /// violation refers to.
    pub fn run(&self, path: &impl PathView, origin: NodeId) -> Option<PathEvent> {
        let mut node = origin;
        while let Some(pred) = path.pred(node) {
            if self.differs(path.state(node), path.state(pred)) {
                return Some(PathEvent {
                    node,
                    range: path.range(node),
                    label: self.label.clone(),
                });
            }
            node = pred;
        }
        None
    }

    fn differs(&self, current: &ProgramState, pred: &ProgramState) -> bool {
        match self.family {
            ProtocolFamily::Request => {
                current.requests.get(&self.handle) != pred.requests.get(&self.handle)
            }
            ProtocolFamily::File => current.files.get(&self.handle) != pred.files.get(&self.handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_ir::location::MemLocation;
    use vigil_ir::state::RequestState;

    struct Chain {
        preds: Vec<Option<NodeId>>,
        states: Vec<ProgramState>,
        ranges: Vec<Option<SourceRange>>,
    }

    impl PathView for Chain {
        fn pred(&self, node: NodeId) -> Option<NodeId> {
            self.preds[node]
        }
        fn state(&self, node: NodeId) -> &ProgramState {
            &self.states[node]
        }
        fn range(&self, node: NodeId) -> Option<SourceRange> {
            self.ranges[node]
        }
    }

    #[test]
    fn finds_the_establishing_node() {
        let h = Handle::resolve(&MemLocation::variable(1, "req")).unwrap();
        let empty = ProgramState::new();
        let nonblocking = empty.with_request(h.clone(), RequestState::Nonblocking);

        // n0 (empty) -> n1 (nonblocking, call range) -> n2 (unchanged).
        let chain = Chain {
            preds: vec![None, Some(0), Some(1)],
            states: vec![empty, nonblocking.clone(), nonblocking],
            ranges: vec![None, Some(SourceRange::new(10, 20)), None],
        };

        let visitor = StateChangeVisitor::new(ProtocolFamily::Request, h, "previously here");
        let event = visitor.run(&chain, 2).expect("state change is on the path");
        assert_eq!(event.node, 1);
        assert_eq!(event.range, Some(SourceRange::new(10, 20)));
        assert_eq!(event.label, "previously here");
    }

    #[test]
    fn no_change_yields_no_event() {
        let h = Handle::resolve(&MemLocation::variable(1, "req")).unwrap();
        let empty = ProgramState::new();
        let chain = Chain {
            preds: vec![None, Some(0)],
            states: vec![empty.clone(), empty],
            ranges: vec![None, None],
        };
        let visitor = StateChangeVisitor::new(ProtocolFamily::Request, h, "label");
        assert!(visitor.run(&chain, 1).is_none());
    }
}
