//! Comment domain model.
//!
//! # Responsibility
//! - Define the comment record and its serialized shape.
//! - Validate content before it reaches persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another comment.
//! - `content` is never the empty string. Whitespace is kept verbatim.
//! - `creator` never changes after creation.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a comment.
pub type CommentId = Uuid;

/// Comment owned by exactly one user.
///
/// Serialized as `{ "id", "content", "creator" }` with ids in hyphenated
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    /// Owning user. Only this user may edit or delete the comment.
    pub creator: UserId,
}

/// Validation failures for comment records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyContent,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "comment content must not be empty"),
        }
    }
}

impl Error for CommentValidationError {}

impl Comment {
    /// Creates a comment with a freshly generated id.
    pub fn new(content: impl Into<String>, creator: UserId) -> Self {
        Self::with_id(Uuid::new_v4(), content, creator)
    }

    /// Creates a comment with a caller-provided id.
    ///
    /// Used by read paths rebuilding records from storage.
    pub fn with_id(id: CommentId, content: impl Into<String>, creator: UserId) -> Self {
        Self {
            id,
            content: content.into(),
            creator,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        validate_content(&self.content)
    }

    /// Returns whether `user_id` is the owner of this comment.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.creator == user_id
    }
}

/// Rejects empty comment bodies. Whitespace-only content is accepted.
pub fn validate_content(content: &str) -> Result<(), CommentValidationError> {
    if content.is_empty() {
        return Err(CommentValidationError::EmptyContent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_content, Comment, CommentValidationError};
    use uuid::Uuid;

    #[test]
    fn only_empty_content_is_rejected() {
        assert_eq!(
            validate_content(""),
            Err(CommentValidationError::EmptyContent)
        );
        assert!(validate_content("   \n").is_ok());
        assert!(validate_content("hi").is_ok());
    }

    #[test]
    fn ownership_is_exact_identity() {
        let owner = Uuid::new_v4();
        let comment = Comment::new("hello", owner);
        assert!(comment.is_owned_by(owner));
        assert!(!comment.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn serializes_with_flat_string_ids() {
        let owner = Uuid::new_v4();
        let comment = Comment::new("hello", owner);
        let value = serde_json::to_value(&comment).expect("comment should serialize");
        assert_eq!(value["id"], comment.id.to_string());
        assert_eq!(value["content"], "hello");
        assert_eq!(value["creator"], owner.to_string());
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
    }
}
