//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document store calls into comment use-cases.
//! - Keep request boundary code decoupled from storage details.

pub mod comment_service;
