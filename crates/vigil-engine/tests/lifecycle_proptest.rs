//! Property tests: the path-sensitive checker agrees with a direct fold of
//! the two per-handle state machines on arbitrary single-handle paths.

use std::sync::Arc;

use proptest::prelude::*;
use vigil_engine::checker::LifecycleChecker;
use vigil_engine::classifier::CallClassifier;
use vigil_engine::explore::PathExplorer;
use vigil_engine::host::CallEvent;
use vigil_engine::report::ViolationKind;
use vigil_ir::location::{MemLocation, SourceRange};
use vigil_ir::proptest_generators::{arb_lifecycle_ops, LifecycleOp};
use vigil_ir::state::{FileState, RequestState};

const SYMBOL: u64 = 1;

/// Reference semantics: fold the request and file state machines directly
/// over the operation sequence, collecting expected violations in order.
fn reference_reports(ops: &[LifecycleOp]) -> Vec<ViolationKind> {
    let mut request: Option<RequestState> = None;
    let mut file: Option<FileState> = None;
    let mut reports = Vec::new();

    for op in ops {
        match op {
            LifecycleOp::Nonblocking => {
                if request == Some(RequestState::Nonblocking) {
                    reports.push(ViolationKind::DoubleNonblocking);
                }
                request = Some(RequestState::Nonblocking);
            }
            LifecycleOp::Wait => {
                if request.is_none() {
                    reports.push(ViolationKind::UnmatchedWait);
                }
                request = Some(RequestState::Wait);
            }
            LifecycleOp::Open => {
                if file == Some(FileState::Open) {
                    reports.push(ViolationKind::DoubleOpen);
                }
                file = Some(FileState::Open);
            }
            LifecycleOp::Close => {
                if file == Some(FileState::Close) {
                    reports.push(ViolationKind::DoubleClose);
                }
                file = Some(FileState::Close);
            }
            LifecycleOp::SymbolDeath => {
                if request == Some(RequestState::Nonblocking) {
                    reports.push(ViolationKind::MissingWait);
                }
                if file == Some(FileState::Open) {
                    reports.push(ViolationKind::FileLeak);
                }
                request = None;
                file = None;
            }
        }
    }
    reports
}

fn drive(ops: &[LifecycleOp]) -> PathExplorer {
    let mut explorer = PathExplorer::new(LifecycleChecker::new(Arc::new(CallClassifier::mpi())));
    for (i, op) in ops.iter().enumerate() {
        let at = i * 10;
        let range = SourceRange::new(at, at + 10);
        let handle_arg = Some(MemLocation::variable(SYMBOL, "h"));
        match op {
            LifecycleOp::Nonblocking => explorer.step_call(&CallEvent::new(
                "MPI_Isend",
                vec![None, handle_arg],
                range,
            )),
            LifecycleOp::Wait => {
                explorer.step_call(&CallEvent::new("MPI_Wait", vec![handle_arg, None], range))
            }
            LifecycleOp::Open => explorer.step_call(&CallEvent::new(
                "MPI_File_open",
                vec![None, handle_arg],
                range,
            )),
            LifecycleOp::Close => {
                explorer.step_call(&CallEvent::new("MPI_File_close", vec![handle_arg], range))
            }
            LifecycleOp::SymbolDeath => explorer.step_symbol_death([SYMBOL]),
        }
    }
    explorer
}

proptest! {
    #[test]
    fn checker_matches_the_reference_fold(ops in arb_lifecycle_ops(24)) {
        let explorer = drive(&ops);
        let observed: Vec<ViolationKind> =
            explorer.reports().iter().map(|r| r.kind).collect();
        prop_assert_eq!(observed, reference_reports(&ops));
    }

    #[test]
    fn every_report_names_the_handle(ops in arb_lifecycle_ops(24)) {
        let explorer = drive(&ops);
        for report in explorer.reports() {
            prop_assert!(report.message.contains("'h'"), "message: {}", report.message);
            prop_assert_eq!(report.interesting.descriptive_name(), "h");
        }
    }

    #[test]
    fn prior_event_reports_resolve_a_secondary_location(ops in arb_lifecycle_ops(24)) {
        let explorer = drive(&ops);
        for report in explorer.reports() {
            if report.visitor.is_some() {
                let secondary = explorer.resolve_secondary(report);
                prop_assert!(
                    secondary.is_some(),
                    "{:?} report has a visitor but no establishing node",
                    report.kind
                );
            }
        }
    }
}
