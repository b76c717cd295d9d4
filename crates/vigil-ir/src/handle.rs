use std::fmt;
use std::hash::{Hash, Hasher};

use crate::location::{LocationKind, MemLocation, SourceRange, SymbolId};

/// Canonical identity for a resource-bearing memory location, used as the
/// key into a lifecycle store.
///
/// Identity is structural: two handles are equal iff they denote the same
/// storage, i.e. the same root symbol plus the same optional element index.
/// The name and declaration range are presentation data and never
/// participate in equality or hashing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Handle {
    symbol: SymbolId,
    index: Option<u64>,
    name: String,
    decl_range: Option<SourceRange>,
}

impl Handle {
    /// Resolve a raw location to a tracked handle.
    ///
    /// Returns `None` for locations whose element type the host cannot
    /// attest, and for array-element locations whose base aggregate is
    /// untyped. State comparisons and diagnostics require type fidelity, so
    /// such locations are excluded from tracking entirely.
    pub fn resolve(location: &MemLocation) -> Option<Handle> {
        if !location.typed {
            return None;
        }
        let index = match location.kind {
            LocationKind::Variable => None,
            LocationKind::Element { base_typed, .. } if !base_typed => return None,
            LocationKind::Element { index, .. } => Some(index),
        };
        Some(Handle {
            symbol: location.symbol,
            index,
            name: location.name.clone(),
            decl_range: location.decl_range,
        })
    }

    /// Derive the handle for element `index` of the aggregate rooted at
    /// `base`. Used when a multi-handle wait enumerates a request array.
    pub fn element(base: &MemLocation, index: u64) -> Handle {
        Handle {
            symbol: base.symbol,
            index: Some(index),
            name: base.name.clone(),
            decl_range: base.decl_range,
        }
    }

    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    pub fn index(&self) -> Option<u64> {
        self.index
    }

    pub fn decl_range(&self) -> Option<SourceRange> {
        self.decl_range
    }

    /// Human-readable name for report messages: `req` or `req[2]`.
    pub fn descriptive_name(&self) -> String {
        match self.index {
            Some(i) => format!("{}[{i}]", self.name),
            None => self.name.clone(),
        }
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol && self.index == other.index
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptive_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_variable_resolves() {
        let loc = MemLocation::variable(1, "req");
        let h = Handle::resolve(&loc).expect("typed variable resolves");
        assert_eq!(h.symbol(), 1);
        assert_eq!(h.index(), None);
        assert_eq!(h.descriptive_name(), "req");
    }

    #[test]
    fn untyped_location_is_rejected() {
        let loc = MemLocation::variable(1, "req").untyped();
        assert!(Handle::resolve(&loc).is_none());
    }

    #[test]
    fn element_with_untyped_base_is_rejected() {
        let mut loc = MemLocation::element(1, "arr", 0);
        loc.kind = LocationKind::Element {
            index: 0,
            base_typed: false,
        };
        assert!(Handle::resolve(&loc).is_none());
    }

    #[test]
    fn identity_is_structural() {
        let a = Handle::resolve(&MemLocation::variable(7, "first_name")).unwrap();
        let b = Handle::resolve(&MemLocation::variable(7, "other_name")).unwrap();
        // Same storage location: equal regardless of the reported name.
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_elements_are_distinct_handles() {
        let e0 = Handle::resolve(&MemLocation::element(3, "arr", 0)).unwrap();
        let e1 = Handle::resolve(&MemLocation::element(3, "arr", 1)).unwrap();
        assert_ne!(e0, e1);
        assert_eq!(e0.descriptive_name(), "arr[0]");
        assert_eq!(e1.descriptive_name(), "arr[1]");
    }

    #[test]
    fn whole_aggregate_differs_from_its_elements() {
        let whole = Handle::resolve(&MemLocation::variable(3, "arr")).unwrap();
        let e0 = Handle::resolve(&MemLocation::element(3, "arr", 0)).unwrap();
        assert_ne!(whole, e0);
    }

    #[test]
    fn derived_element_matches_resolved_element() {
        let base = MemLocation::variable(3, "arr");
        let derived = Handle::element(&base, 2);
        let resolved = Handle::resolve(&MemLocation::element(3, "arr", 2)).unwrap();
        assert_eq!(derived, resolved);
    }
}
