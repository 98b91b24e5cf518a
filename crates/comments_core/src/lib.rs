//! Comments resource core.
//! Owns comment records and keeps each creator's comment collection in
//! step with them.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{ApiResponse, CommentsApi};
pub use auth::{AuthError, AuthGate, BearerTokenGate};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::comment::{Comment, CommentId, CommentValidationError};
pub use model::user::{User, UserId};
pub use repo::document_store::{
    DocumentStore, RepoError, RepoResult, SqliteDocumentStore, SqliteSession, StoreSession,
};
pub use service::comment_service::{CommentService, CommentServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
