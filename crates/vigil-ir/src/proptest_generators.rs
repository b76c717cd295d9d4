//! Proptest strategies for generating handles and lifecycle operations.

use proptest::prelude::*;

use crate::handle::Handle;
use crate::location::MemLocation;
use crate::state::{FileState, RequestState};

/// A single recognized lifecycle operation on one handle, plus symbol death.
///
/// This is the event alphabet the engine's property tests fold over: the
/// same sequence is replayed through the checker and through a direct
/// per-handle state-machine fold, and the two report multisets must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Nonblocking,
    Wait,
    Open,
    Close,
    SymbolDeath,
}

/// Strategy for one lifecycle operation.
pub fn arb_lifecycle_op() -> impl Strategy<Value = LifecycleOp> {
    prop_oneof![
        Just(LifecycleOp::Nonblocking),
        Just(LifecycleOp::Wait),
        Just(LifecycleOp::Open),
        Just(LifecycleOp::Close),
        Just(LifecycleOp::SymbolDeath),
    ]
}

/// Strategy for an operation sequence of up to `max_len` events.
pub fn arb_lifecycle_ops(max_len: usize) -> impl Strategy<Value = Vec<LifecycleOp>> {
    proptest::collection::vec(arb_lifecycle_op(), 0..=max_len)
}

/// Strategy for a resolvable handle: either a direct variable or an array
/// element with a small index, over a small symbol space so collisions (the
/// same storage reached twice) actually occur.
pub fn arb_handle() -> impl Strategy<Value = Handle> {
    (0..4u64, proptest::option::of(0..4u64)).prop_map(|(symbol, index)| {
        let location = match index {
            None => MemLocation::variable(symbol, format!("v{symbol}")),
            Some(i) => MemLocation::element(symbol, format!("v{symbol}"), i),
        };
        Handle::resolve(&location).expect("generated locations are typed")
    })
}

/// Strategy for a request state.
pub fn arb_request_state() -> impl Strategy<Value = RequestState> {
    prop_oneof![Just(RequestState::Nonblocking), Just(RequestState::Wait)]
}

/// Strategy for a file state.
pub fn arb_file_state() -> impl Strategy<Value = FileState> {
    prop_oneof![Just(FileState::Open), Just(FileState::Close)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LifecycleStore;

    proptest! {
        #[test]
        fn store_versions_never_interfere(
            handles in proptest::collection::vec(arb_handle(), 1..8),
            states in proptest::collection::vec(arb_request_state(), 1..8),
        ) {
            let mut versions = vec![LifecycleStore::new()];
            for (h, s) in handles.iter().zip(states.iter()) {
                let next = versions.last().unwrap().set(h.clone(), *s);
                versions.push(next);
            }
            // Each version's length is non-decreasing and bounded by the
            // number of distinct handles inserted so far.
            for window in versions.windows(2) {
                prop_assert!(window[1].len() >= window[0].len());
                prop_assert!(window[1].len() <= window[0].len() + 1);
            }
            // The empty root version is still empty.
            prop_assert!(versions[0].is_empty());
        }
    }
}
