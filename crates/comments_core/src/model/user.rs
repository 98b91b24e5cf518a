//! User read model.
//!
//! Users are owned by the surrounding application; this crate only reads
//! them and maintains their comment collection.

use crate::model::comment::CommentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a user.
pub type UserId = Uuid;

/// Comment author, with the ids of the comments they created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Comment references in insertion order. Loaded from the store on
    /// every read.
    pub comments: Vec<CommentId>,
}

impl User {
    /// Creates a user with a fresh id and an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            comments: Vec::new(),
        }
    }
}
