//! Static classification of callee identifiers into lifecycle operations.
//!
//! The table is data, not analysis: it is built once per analysis unit,
//! shared by immutable reference, and never mutated afterwards.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operation kinds relevant to resource-lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Starts a nonblocking request on the designated handle.
    Nonblocking,
    /// Completes a single request.
    Wait,
    /// Completes every request in an array of handles.
    WaitAll,
    /// Opens a file-like resource.
    FileOpen,
    /// Closes a file-like resource.
    FileClose,
}

impl OperationKind {
    /// Designated handle argument position for a call with `num_args`
    /// arguments, by convention of the modeled API: the last argument for
    /// nonblocking/open/close calls, argument 0 for a single wait,
    /// argument 1 for a multi-handle wait.
    pub fn handle_argument(self, num_args: usize) -> Option<usize> {
        match self {
            OperationKind::Wait => (num_args > 0).then_some(0),
            OperationKind::WaitAll => (num_args > 1).then_some(1),
            OperationKind::Nonblocking | OperationKind::FileOpen | OperationKind::FileClose => {
                num_args.checked_sub(1)
            }
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Nonblocking => write!(f, "nonblocking"),
            OperationKind::Wait => write!(f, "wait"),
            OperationKind::WaitAll => write!(f, "waitall"),
            OperationKind::FileOpen => write!(f, "open"),
            OperationKind::FileClose => write!(f, "close"),
        }
    }
}

/// Error building a classification table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("identifier '{identifier}' registered as both {existing} and {requested}")]
    ConflictingKind {
        identifier: String,
        existing: OperationKind,
        requested: OperationKind,
    },
}

/// Read-only lookup table from callee identifier to operation kind.
#[derive(Debug, Clone, Default)]
pub struct CallClassifier {
    table: IndexMap<String, OperationKind>,
}

impl CallClassifier {
    pub fn builder() -> CallClassifierBuilder {
        CallClassifierBuilder::default()
    }

    /// Classify a callee identifier. Identifiers outside the table are not
    /// lifecycle operations and are skipped by the checker.
    pub fn classify(&self, callee: &str) -> Option<OperationKind> {
        self.table.get(callee).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The MPI classification table, matching the API family the checker
    /// was originally written against.
    pub fn mpi() -> Self {
        let nonblocking = [
            "MPI_Isend",
            "MPI_Issend",
            "MPI_Ibsend",
            "MPI_Irsend",
            "MPI_Irecv",
            "MPI_Iscatter",
            "MPI_Igather",
            "MPI_Iallgather",
            "MPI_Ibcast",
            "MPI_Ireduce",
            "MPI_Iallreduce",
            "MPI_Ialltoall",
            "MPI_File_iread",
            "MPI_File_iwrite",
        ];

        let mut table = IndexMap::new();
        for name in nonblocking {
            table.insert(name.to_owned(), OperationKind::Nonblocking);
        }
        table.insert("MPI_Wait".to_owned(), OperationKind::Wait);
        table.insert("MPI_Waitall".to_owned(), OperationKind::WaitAll);
        table.insert("MPI_File_open".to_owned(), OperationKind::FileOpen);
        table.insert("MPI_File_close".to_owned(), OperationKind::FileClose);

        CallClassifier { table }
    }
}

/// Builder for a custom classification table.
#[derive(Debug, Default)]
pub struct CallClassifierBuilder {
    table: IndexMap<String, OperationKind>,
}

impl CallClassifierBuilder {
    /// Register an identifier under an operation kind. Re-registering the
    /// same identifier under the same kind is a no-op; a different kind is
    /// a configuration error.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        kind: OperationKind,
    ) -> Result<&mut Self, ClassifierError> {
        let identifier = identifier.into();
        match self.table.get(&identifier) {
            Some(&existing) if existing != kind => Err(ClassifierError::ConflictingKind {
                identifier,
                existing,
                requested: kind,
            }),
            _ => {
                self.table.insert(identifier, kind);
                Ok(self)
            }
        }
    }

    pub fn build(self) -> CallClassifier {
        CallClassifier { table: self.table }
    }
}
