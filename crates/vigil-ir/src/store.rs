use std::sync::Arc;

use indexmap::IndexMap;

use crate::handle::Handle;
use crate::state::{FileState, RequestState};

/// Immutable, versioned mapping from handle to lifecycle state.
///
/// Every mutation yields a new version; prior versions remain valid and are
/// what earlier path nodes still reference. Snapshots are O(1) `Arc` clones,
/// mutation copies the backing map (copy-on-write). Path forks therefore
/// diverge without locks: each branch keeps mutating its own version while
/// the pre-fork version stays untouched.
///
/// The map is keyed by [`Handle`], so by construction it never carries an
/// entry for a location whose identity could not be resolved, and map
/// semantics give at most one entry per handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleStore<S> {
    entries: Arc<IndexMap<Handle, S>>,
}

impl<S: Clone> LifecycleStore<S> {
    pub fn new() -> Self {
        LifecycleStore {
            entries: Arc::new(IndexMap::new()),
        }
    }

    pub fn get(&self, handle: &Handle) -> Option<&S> {
        self.entries.get(handle)
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.entries.contains_key(handle)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Handle, &S)> {
        self.entries.iter()
    }

    /// New version with `handle` bound to `state`, overwriting any previous
    /// entry for the same storage location.
    #[must_use]
    pub fn set(&self, handle: Handle, state: S) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(handle, state);
        LifecycleStore {
            entries: Arc::new(entries),
        }
    }

    /// New version without an entry for `handle`. Returns an unchanged
    /// snapshot when no entry exists.
    #[must_use]
    pub fn remove(&self, handle: &Handle) -> Self {
        if !self.entries.contains_key(handle) {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.shift_remove(handle);
        LifecycleStore {
            entries: Arc::new(entries),
        }
    }
}

impl<S: Clone> Default for LifecycleStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete per-path lifecycle state: one store per protocol family.
///
/// One logical instance is threaded through each explored path; all helpers
/// version rather than mutate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramState {
    pub requests: LifecycleStore<RequestState>,
    pub files: LifecycleStore<FileState>,
}

impl ProgramState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request(&self, handle: Handle, state: RequestState) -> Self {
        ProgramState {
            requests: self.requests.set(handle, state),
            files: self.files.clone(),
        }
    }

    #[must_use]
    pub fn without_request(&self, handle: &Handle) -> Self {
        ProgramState {
            requests: self.requests.remove(handle),
            files: self.files.clone(),
        }
    }

    #[must_use]
    pub fn with_file(&self, handle: Handle, state: FileState) -> Self {
        ProgramState {
            requests: self.requests.clone(),
            files: self.files.set(handle, state),
        }
    }

    #[must_use]
    pub fn without_file(&self, handle: &Handle) -> Self {
        ProgramState {
            requests: self.requests.clone(),
            files: self.files.remove(handle),
        }
    }
}
