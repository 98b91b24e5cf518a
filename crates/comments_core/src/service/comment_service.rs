//! Comment use-case service.
//!
//! # Responsibility
//! - Provide get/list/create/update/delete entry points over comments.
//! - Keep a comment and its creator's collection consistent through
//!   store sessions.
//! - Enforce creator-only mutation.
//!
//! # Invariants
//! - `create` inserts the comment and appends it to the creator's
//!   collection in one session; `delete` removes and pulls in one session.
//! - A failed session is never committed.
//! - The service holds no state besides the injected store; collections are
//!   re-read on every call.

use crate::model::comment::{validate_content, Comment, CommentId};
use crate::model::user::UserId;
use crate::repo::document_store::{DocumentStore, RepoError, RepoResult, StoreSession};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const MSG_INVALID_INPUT: &str = "Invalid inputs passed, please check your data.";
const MSG_GET_FAILED: &str = "Something went wrong, could not find a comment.";
pub(crate) const MSG_COMMENT_NOT_FOUND: &str = "Could not find comment for the provided id.";
const MSG_LIST_FAILED: &str = "Fetching comments failed, please try again later.";
pub(crate) const MSG_LIST_NOT_FOUND: &str = "Could not find comments for the provided user id.";
const MSG_CREATE_FAILED: &str = "Creating comment failed, please try again.";
const MSG_USER_NOT_FOUND: &str = "Could not find user for provided id.";
const MSG_UPDATE_FAILED: &str = "Something went wrong, could not update comment.";
const MSG_UPDATE_FORBIDDEN: &str = "You are not allowed to edit this comment.";
const MSG_DELETE_FAILED: &str = "Something went wrong, could not delete comment.";
pub(crate) const MSG_DELETE_NOT_FOUND: &str = "Could not find comment for this id.";
const MSG_DELETE_FORBIDDEN: &str = "You are not allowed to delete this comment.";

pub type ServiceResult<T> = Result<T, CommentServiceError>;

/// Service error for comment use-cases.
///
/// Every variant carries the user-facing message; `status_code` gives the
/// HTTP status the request boundary responds with.
#[derive(Debug)]
pub enum CommentServiceError {
    /// Comment or user is absent.
    NotFound(&'static str),
    /// Caller is authenticated but does not own the comment.
    Forbidden(&'static str),
    /// Malformed input.
    ValidationFailed(&'static str),
    /// A read against the store errored.
    StoreUnavailable {
        message: &'static str,
        source: RepoError,
    },
    /// A write, or a lookup feeding a write, errored. Nothing was committed.
    WriteFailed {
        message: &'static str,
        source: RepoError,
    },
}

impl CommentServiceError {
    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 401,
            Self::ValidationFailed(_) => 422,
            Self::StoreUnavailable { .. } | Self::WriteFailed { .. } => 500,
        }
    }

    /// User-facing message for this failure.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound(message)
            | Self::Forbidden(message)
            | Self::ValidationFailed(message) => *message,
            Self::StoreUnavailable { message, .. } | Self::WriteFailed { message, .. } => *message,
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::ValidationFailed(_) => "validation_failed",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::WriteFailed { .. } => "write_failed",
        }
    }
}

impl Display for CommentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable { message, source } | Self::WriteFailed { message, source } => {
                write!(f, "{message} ({source})")
            }
            other => write!(f, "{}", other.message()),
        }
    }
}

impl Error for CommentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable { source, .. } | Self::WriteFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Comment service facade over an injected document store.
pub struct CommentService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CommentService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gets one comment by id.
    pub fn get_by_id(&self, comment_id: CommentId) -> ServiceResult<Comment> {
        match self.store.find_comment(comment_id) {
            Ok(Some(comment)) => Ok(comment),
            Ok(None) => Err(CommentServiceError::NotFound(MSG_COMMENT_NOT_FOUND)),
            Err(source) => Err(CommentServiceError::StoreUnavailable {
                message: MSG_GET_FAILED,
                source,
            }),
        }
    }

    /// Lists the comments of one user, in collection order.
    ///
    /// An unknown user and a user without comments both yield `NotFound`.
    pub fn list_by_user(&self, user_id: UserId) -> ServiceResult<Vec<Comment>> {
        match self.store.find_user_with_comments(user_id) {
            Ok(Some((_, comments))) if !comments.is_empty() => Ok(comments),
            Ok(_) => Err(CommentServiceError::NotFound(MSG_LIST_NOT_FOUND)),
            Err(source) => Err(CommentServiceError::StoreUnavailable {
                message: MSG_LIST_FAILED,
                source,
            }),
        }
    }

    /// Creates a comment owned by `user_id` and appends it to the user's
    /// collection atomically.
    pub fn create(&self, content: &str, user_id: UserId) -> ServiceResult<Comment> {
        let started_at = Instant::now();
        validate_content(content)
            .map_err(|_| CommentServiceError::ValidationFailed(MSG_INVALID_INPUT))?;

        let user = match self.store.find_user(user_id) {
            Ok(Some(user)) => user,
            Ok(None) => return Err(CommentServiceError::NotFound(MSG_USER_NOT_FOUND)),
            Err(source) => {
                return Err(log_failure(
                    "comment_create",
                    started_at,
                    CommentServiceError::WriteFailed {
                        message: MSG_CREATE_FAILED,
                        source,
                    },
                ))
            }
        };

        let comment = Comment::new(content, user.id);
        if let Err(source) = self.insert_and_link(&comment) {
            return Err(log_failure(
                "comment_create",
                started_at,
                CommentServiceError::WriteFailed {
                    message: MSG_CREATE_FAILED,
                    source,
                },
            ));
        }

        info!(
            "event=comment_create module=service status=ok comment_id={} user_id={} duration_ms={}",
            comment.id,
            user.id,
            started_at.elapsed().as_millis()
        );
        Ok(comment)
    }

    /// Replaces the content of a comment owned by `user_id`.
    pub fn update(
        &self,
        comment_id: CommentId,
        content: &str,
        user_id: UserId,
    ) -> ServiceResult<Comment> {
        let started_at = Instant::now();
        validate_content(content)
            .map_err(|_| CommentServiceError::ValidationFailed(MSG_INVALID_INPUT))?;

        let mut comment = match self.store.find_comment(comment_id) {
            Ok(Some(comment)) => comment,
            Ok(None) => return Err(CommentServiceError::NotFound(MSG_COMMENT_NOT_FOUND)),
            Err(source) => {
                return Err(log_failure(
                    "comment_update",
                    started_at,
                    CommentServiceError::WriteFailed {
                        message: MSG_UPDATE_FAILED,
                        source,
                    },
                ))
            }
        };

        if !comment.is_owned_by(user_id) {
            return Err(log_failure(
                "comment_update",
                started_at,
                CommentServiceError::Forbidden(MSG_UPDATE_FORBIDDEN),
            ));
        }

        comment.content = content.to_string();
        if let Err(source) = self.store.save_comment(&comment) {
            return Err(log_failure(
                "comment_update",
                started_at,
                CommentServiceError::WriteFailed {
                    message: MSG_UPDATE_FAILED,
                    source,
                },
            ));
        }

        info!(
            "event=comment_update module=service status=ok comment_id={} duration_ms={}",
            comment.id,
            started_at.elapsed().as_millis()
        );
        Ok(comment)
    }

    /// Deletes a comment owned by `user_id` and pulls it from the creator's
    /// collection atomically.
    ///
    /// Lookup errors are reported as `WriteFailed`, same as session errors.
    pub fn delete(&self, comment_id: CommentId, user_id: UserId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let (comment, creator) = match self.store.find_comment_with_creator(comment_id) {
            Ok(Some(found)) => found,
            Ok(None) => return Err(CommentServiceError::NotFound(MSG_DELETE_NOT_FOUND)),
            Err(source) => {
                return Err(log_failure(
                    "comment_delete",
                    started_at,
                    CommentServiceError::WriteFailed {
                        message: MSG_DELETE_FAILED,
                        source,
                    },
                ))
            }
        };

        if creator.id != user_id {
            return Err(log_failure(
                "comment_delete",
                started_at,
                CommentServiceError::Forbidden(MSG_DELETE_FORBIDDEN),
            ));
        }

        if let Err(source) = self.remove_and_unlink(comment.id, creator.id) {
            return Err(log_failure(
                "comment_delete",
                started_at,
                CommentServiceError::WriteFailed {
                    message: MSG_DELETE_FAILED,
                    source,
                },
            ));
        }

        info!(
            "event=comment_delete module=service status=ok comment_id={} user_id={} duration_ms={}",
            comment.id,
            creator.id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn insert_and_link(&self, comment: &Comment) -> RepoResult<()> {
        let mut session = self.store.start_session()?;
        session.insert_comment(comment)?;
        session.push_user_comment(comment.creator, comment.id)?;
        session.commit()
    }

    fn remove_and_unlink(&self, comment_id: CommentId, creator_id: UserId) -> RepoResult<()> {
        let mut session = self.store.start_session()?;
        session.remove_comment(comment_id)?;
        session.pull_user_comment(creator_id, comment_id)?;
        session.commit()
    }
}

fn log_failure(
    event: &str,
    started_at: Instant,
    err: CommentServiceError,
) -> CommentServiceError {
    warn!(
        "event={} module=service status=error duration_ms={} error_code={} error={}",
        event,
        started_at.elapsed().as_millis(),
        err.code(),
        err
    );
    err
}
