//! Domain model for comments and their owning users.
//!
//! # Responsibility
//! - Define the canonical records used by the comment service.
//! - Keep identity types explicit in signatures.
//!
//! # Invariants
//! - A comment's `creator` is fixed at creation time.
//! - A user's comment collection is a read view; the store owns it.

pub mod comment;
pub mod user;
