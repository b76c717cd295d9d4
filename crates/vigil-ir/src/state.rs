use std::fmt;

/// The two independently tracked protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolFamily {
    /// Nonblocking-call / wait pairing.
    Request,
    /// Explicit open / close pairing.
    File,
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolFamily::Request => write!(f, "request"),
            ProtocolFamily::File => write!(f, "file"),
        }
    }
}

/// Lifecycle state of a nonblocking request.
///
/// The unset state is implicit: a handle with no store entry has never been
/// used by a recognized request operation on the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestState {
    /// A nonblocking call was issued and has not been waited on.
    Nonblocking,
    /// A matching wait completed the request.
    Wait,
}

impl RequestState {
    /// Whether symbol death in this state is a missing-termination finding.
    pub fn needs_termination(self) -> bool {
        matches!(self, RequestState::Nonblocking)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Nonblocking => write!(f, "nonblocking"),
            RequestState::Wait => write!(f, "wait"),
        }
    }
}

/// Lifecycle state of an open/close resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum FileState {
    Open,
    Close,
}

impl FileState {
    pub fn needs_termination(self) -> bool {
        matches!(self, FileState::Open)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Open => write!(f, "open"),
            FileState::Close => write!(f, "close"),
        }
    }
}
