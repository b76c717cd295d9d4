#![doc = include_str!("../README.md")]

//! Vigil data model.
//!
//! This crate defines the symbolic handle identity model, the lifecycle
//! states of the two tracked protocol families, and the versioned
//! copy-on-write store that carries per-path protocol state through the
//! host's path exploration.

pub mod handle;
pub mod location;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod state;
pub mod store;
