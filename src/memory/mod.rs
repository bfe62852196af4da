//! Query engine orchestrating tenant indexes, embedding and generation.
//!
//! Provides the high-level API for storing, searching, resolving and asking
//! about documents in per-tenant indexes.

mod ask;
mod crud;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use store::{EngineOptions, MemoryEngine};
