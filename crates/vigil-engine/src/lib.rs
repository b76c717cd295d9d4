#![doc = include_str!("../README.md")]

//! Vigil checker engine.
//!
//! This crate contains the call classifier table, the per-family protocol
//! transition engine, the liveness sweep, the bug reporter with its backward
//! path-search visitor, the host interface the checker is driven through,
//! and a reference path explorer used to drive the checker and replay
//! visitors in tests.

pub mod checker;
pub mod classifier;
pub mod explore;
pub mod host;
pub mod report;
pub mod sweep;
pub mod visitor;
