//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the document store contract the comment service composes with.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths enforce `Comment::validate()` before persistence.
//! - Multi-record writes only happen inside a `StoreSession`.

pub mod document_store;
