use std::fmt;

/// A unique identifier for a program symbol, the root of a memory location.
///
/// Symbols are minted by the host analysis engine; the checker only ever
/// compares them for equality and queries the reaper for their liveness.
pub type SymbolId = u64;

/// A half-open source range in byte offsets, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        SourceRange { start, end }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// How a raw location addresses its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum LocationKind {
    /// A direct variable or field access.
    Variable,
    /// An access through array indexing into the aggregate rooted at the
    /// location's symbol. `base_typed` is the host's attestation for the
    /// aggregate itself.
    Element { index: u64, base_typed: bool },
}

/// A raw memory location produced by the host when it evaluates a call
/// argument as a handle candidate.
///
/// This is the untrusted side of the identity model: the location may be
/// untyped or otherwise unusable, in which case [`crate::handle::Handle`]
/// resolution rejects it and the call argument is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MemLocation {
    /// Root symbol of the storage.
    pub symbol: SymbolId,
    /// Source-level name of the root storage, for report messages.
    pub name: String,
    pub kind: LocationKind,
    /// Whether the host's type system attests a statically known element
    /// type for this location.
    pub typed: bool,
    /// Declaration range of the root storage, when the host knows it.
    pub decl_range: Option<SourceRange>,
}

impl MemLocation {
    /// A typed direct variable location.
    pub fn variable(symbol: SymbolId, name: impl Into<String>) -> Self {
        MemLocation {
            symbol,
            name: name.into(),
            kind: LocationKind::Variable,
            typed: true,
            decl_range: None,
        }
    }

    /// A typed element location inside a typed aggregate.
    pub fn element(symbol: SymbolId, name: impl Into<String>, index: u64) -> Self {
        MemLocation {
            symbol,
            name: name.into(),
            kind: LocationKind::Element {
                index,
                base_typed: true,
            },
            typed: true,
            decl_range: None,
        }
    }

    pub fn with_decl_range(mut self, range: SourceRange) -> Self {
        self.decl_range = Some(range);
        self
    }

    pub fn untyped(mut self) -> Self {
        self.typed = false;
        self
    }
}
