//! Prefabricated reports for the violations found by path-sensitive
//! lifecycle analysis.

use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_ir::handle::Handle;
use vigil_ir::location::SourceRange;
use vigil_ir::state::ProtocolFamily;

use crate::host::NodeId;
use crate::visitor::StateChangeVisitor;

/// The kind of lifecycle violation. Each is a reported finding in the
/// analyzed program, never a failure of the checker itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    DoubleNonblocking,
    UnmatchedWait,
    MissingWait,
    DoubleOpen,
    DoubleClose,
    FileLeak,
}

impl ViolationKind {
    pub fn family(self) -> ProtocolFamily {
        match self {
            ViolationKind::DoubleNonblocking
            | ViolationKind::UnmatchedWait
            | ViolationKind::MissingWait => ProtocolFamily::Request,
            ViolationKind::DoubleOpen | ViolationKind::DoubleClose | ViolationKind::FileLeak => {
                ProtocolFamily::File
            }
        }
    }

    /// Stable diagnostic code for the host's output surface.
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::DoubleNonblocking => "vigil::request::double_nonblocking",
            ViolationKind::UnmatchedWait => "vigil::request::unmatched_wait",
            ViolationKind::MissingWait => "vigil::request::missing_wait",
            ViolationKind::DoubleOpen => "vigil::file::double_open",
            ViolationKind::DoubleClose => "vigil::file::double_close",
            ViolationKind::FileLeak => "vigil::file::leak",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::DoubleNonblocking => write!(f, "double nonblocking"),
            ViolationKind::UnmatchedWait => write!(f, "unmatched wait"),
            ViolationKind::MissingWait => write!(f, "missing wait"),
            ViolationKind::DoubleOpen => write!(f, "double open"),
            ViolationKind::DoubleClose => write!(f, "double close"),
            ViolationKind::FileLeak => write!(f, "file leak"),
        }
    }
}

/// An immutable diagnostic handed to the host's output surface.
///
/// Carries the primary message, the triggering call's source range, the
/// handle's declaration range when known, the anchoring exploration node,
/// and (for kinds referencing a prior event) a backward-search visitor the
/// host replays when the diagnostic path is rendered. The handle is marked
/// interesting so the path renderer prioritizes it when trimming detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugReport {
    pub kind: ViolationKind,
    pub message: String,
    /// Source range of the triggering call; absent for findings raised at
    /// symbol death, which have no call site of their own.
    pub call_range: Option<SourceRange>,
    /// Declaration range of the handle's storage, when the host knows it.
    pub handle_range: Option<SourceRange>,
    /// Diagnostic branch node the finding is anchored at.
    pub node: NodeId,
    /// The handle this report is about, marked interesting for rendering.
    pub interesting: Handle,
    pub visitor: Option<StateChangeVisitor>,
}

impl BugReport {
    pub fn double_nonblocking(handle: &Handle, call_range: SourceRange, node: NodeId) -> Self {
        BugReport {
            kind: ViolationKind::DoubleNonblocking,
            message: format!(
                "Double nonblocking on request '{}'.",
                handle.descriptive_name()
            ),
            call_range: Some(call_range),
            handle_range: handle.decl_range(),
            node,
            interesting: handle.clone(),
            visitor: Some(StateChangeVisitor::new(
                ProtocolFamily::Request,
                handle.clone(),
                "Request is previously used by nonblocking call here.",
            )),
        }
    }

    pub fn unmatched_wait(handle: &Handle, call_range: SourceRange, node: NodeId) -> Self {
        BugReport {
            kind: ViolationKind::UnmatchedWait,
            message: format!(
                "Request '{}' has no matching nonblocking call.",
                handle.descriptive_name()
            ),
            call_range: Some(call_range),
            handle_range: handle.decl_range(),
            node,
            interesting: handle.clone(),
            // No prior event exists for an unmatched wait.
            visitor: None,
        }
    }

    pub fn missing_wait(handle: &Handle, node: NodeId) -> Self {
        BugReport {
            kind: ViolationKind::MissingWait,
            message: format!(
                "Request '{}' has no matching wait.",
                handle.descriptive_name()
            ),
            call_range: None,
            handle_range: handle.decl_range(),
            node,
            interesting: handle.clone(),
            visitor: Some(StateChangeVisitor::new(
                ProtocolFamily::Request,
                handle.clone(),
                "Request is previously used by nonblocking call here.",
            )),
        }
    }

    pub fn double_open(handle: &Handle, call_range: SourceRange, node: NodeId) -> Self {
        BugReport {
            kind: ViolationKind::DoubleOpen,
            message: format!("Double open on file '{}'.", handle.descriptive_name()),
            call_range: Some(call_range),
            handle_range: handle.decl_range(),
            node,
            interesting: handle.clone(),
            visitor: Some(StateChangeVisitor::new(
                ProtocolFamily::File,
                handle.clone(),
                "File is previously opened here.",
            )),
        }
    }

    pub fn double_close(handle: &Handle, call_range: SourceRange, node: NodeId) -> Self {
        BugReport {
            kind: ViolationKind::DoubleClose,
            message: format!("Double close on file '{}'.", handle.descriptive_name()),
            call_range: Some(call_range),
            handle_range: handle.decl_range(),
            node,
            interesting: handle.clone(),
            visitor: Some(StateChangeVisitor::new(
                ProtocolFamily::File,
                handle.clone(),
                "File is previously closed here.",
            )),
        }
    }

    pub fn file_leak(handle: &Handle, node: NodeId) -> Self {
        BugReport {
            kind: ViolationKind::FileLeak,
            message: format!(
                "File '{}' has no matching close.",
                handle.descriptive_name()
            ),
            call_range: None,
            handle_range: handle.decl_range(),
            node,
            interesting: handle.clone(),
            visitor: Some(StateChangeVisitor::new(
                ProtocolFamily::File,
                handle.clone(),
                "File was previously opened here.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_ir::location::MemLocation;

    fn handle() -> Handle {
        Handle::resolve(
            &MemLocation::variable(1, "req").with_decl_range(SourceRange::new(100, 110)),
        )
        .unwrap()
    }

    #[test]
    fn kinds_map_to_families() {
        assert_eq!(
            ViolationKind::DoubleNonblocking.family(),
            ProtocolFamily::Request
        );
        assert_eq!(ViolationKind::UnmatchedWait.family(), ProtocolFamily::Request);
        assert_eq!(ViolationKind::MissingWait.family(), ProtocolFamily::Request);
        assert_eq!(ViolationKind::DoubleOpen.family(), ProtocolFamily::File);
        assert_eq!(ViolationKind::DoubleClose.family(), ProtocolFamily::File);
        assert_eq!(ViolationKind::FileLeak.family(), ProtocolFamily::File);
    }

    #[test]
    fn double_nonblocking_report_shape() {
        let report = BugReport::double_nonblocking(&handle(), SourceRange::new(5, 15), 3);
        assert_eq!(report.kind, ViolationKind::DoubleNonblocking);
        assert_eq!(report.message, "Double nonblocking on request 'req'.");
        assert_eq!(report.call_range, Some(SourceRange::new(5, 15)));
        assert_eq!(report.handle_range, Some(SourceRange::new(100, 110)));
        assert_eq!(report.node, 3);
        assert!(report.visitor.is_some());
    }

    #[test]
    fn unmatched_wait_carries_no_visitor() {
        let report = BugReport::unmatched_wait(&handle(), SourceRange::new(5, 15), 0);
        assert!(report.visitor.is_none());
        assert_eq!(
            report.message,
            "Request 'req' has no matching nonblocking call."
        );
    }

    #[test]
    fn sweep_reports_have_no_call_range() {
        assert!(BugReport::missing_wait(&handle(), 0).call_range.is_none());
        assert!(BugReport::file_leak(&handle(), 0).call_range.is_none());
    }

    #[test]
    fn report_summary_serializes_deterministically() {
        let report = BugReport::double_close(&handle(), SourceRange::new(1, 2), 7);
        let a = serde_json::to_string(&report).unwrap();
        let b = serde_json::to_string(&report).unwrap();
        assert_eq!(a, b);
        let round: BugReport = serde_json::from_str(&a).unwrap();
        assert_eq!(round, report);
    }
}
