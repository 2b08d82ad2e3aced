//! Study-note domain model.
//!
//! # Responsibility
//! - Define the fixed topic set and the note record filed under each topic.
//! - Provide the per-topic aggregate handed out by storage bulk reads.
//!
//! # Invariants
//! - Topics form a closed set known at compile time.
//! - A note name is unique across the whole store, not just within a topic.

pub mod note;
pub mod topic;
