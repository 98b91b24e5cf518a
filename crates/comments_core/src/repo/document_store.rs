//! Document store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookups for comments, users and populated user collections.
//! - Provide write sessions that group multi-record writes into one
//!   transaction.
//!
//! # Invariants
//! - A session commits only through `StoreSession::commit`; dropping it
//!   rolls every write back.
//! - `user_comments` keeps insertion order through `position`.
//! - Read paths reject malformed persisted ids instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::comment::{Comment, CommentId, CommentValidationError};
use crate::model::user::{User, UserId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from document store lookups and writes.
#[derive(Debug)]
pub enum RepoError {
    Validation(CommentValidationError),
    Db(DbError),
    /// Write target does not exist.
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read access plus session factory over comment and user records.
pub trait DocumentStore {
    /// Write session type; holds the transaction until commit or drop.
    type Session<'s>: StoreSession
    where
        Self: 's;

    /// Starts a write session. All writes issued through it are atomic.
    fn start_session(&self) -> RepoResult<Self::Session<'_>>;

    /// Inserts a user record. Seeding only; users are otherwise external.
    fn insert_user(&self, user: &User) -> RepoResult<()>;
    /// Gets one user together with its ordered comment references.
    fn find_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Gets one user with its comment collection expanded to full records.
    fn find_user_with_comments(&self, id: UserId) -> RepoResult<Option<(User, Vec<Comment>)>>;
    fn find_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Gets one comment together with its resolved creator.
    fn find_comment_with_creator(&self, id: CommentId) -> RepoResult<Option<(Comment, User)>>;
    /// Persists a changed comment body. Single-record write, no session.
    fn save_comment(&self, comment: &Comment) -> RepoResult<()>;
}

/// Transactional write handle returned by `DocumentStore::start_session`.
pub trait StoreSession {
    fn insert_comment(&mut self, comment: &Comment) -> RepoResult<()>;
    /// Appends a comment reference to the end of a user's collection.
    fn push_user_comment(&mut self, user_id: UserId, comment_id: CommentId) -> RepoResult<()>;
    fn remove_comment(&mut self, comment_id: CommentId) -> RepoResult<()>;
    /// Removes a comment reference from a user's collection. Removing an
    /// absent reference is a no-op.
    fn pull_user_comment(&mut self, user_id: UserId, comment_id: CommentId) -> RepoResult<()>;
    /// Makes every write of this session durable at once.
    fn commit(self) -> RepoResult<()>;
}

/// SQLite-backed document store.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    type Session<'s>
        = SqliteSession<'s>
    where
        Self: 's;

    fn start_session(&self) -> RepoResult<SqliteSession<'_>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        Ok(SqliteSession { tx })
    }

    fn insert_user(&self, user: &User) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (id, name) VALUES (?1, ?2);",
            params![user.id.to_string(), user.name.as_str()],
        )?;
        Ok(())
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| Ok((row.get::<_, String>("id")?, row.get::<_, String>("name")?)),
            )
            .optional()?;

        let Some((id_text, name)) = user else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT comment_id
             FROM user_comments
             WHERE user_id = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([id_text.as_str()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            comments.push(parse_id(&value, "user_comments.comment_id")?);
        }

        Ok(Some(User {
            id: parse_id(&id_text, "users.id")?,
            name,
            comments,
        }))
    }

    fn find_user_with_comments(&self, id: UserId) -> RepoResult<Option<(User, Vec<Comment>)>> {
        let Some(user) = self.find_user(id)? else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.content, c.creator_id
             FROM user_comments uc
             INNER JOIN comments c ON c.id = uc.comment_id
             WHERE uc.user_id = ?1
             ORDER BY uc.position ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }

        Ok(Some((user, comments)))
    }

    fn find_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, content, creator_id FROM comments WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn find_comment_with_creator(&self, id: CommentId) -> RepoResult<Option<(Comment, User)>> {
        let Some(comment) = self.find_comment(id)? else {
            return Ok(None);
        };
        let creator = self.find_user(comment.creator)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "comment {} references missing creator {}",
                comment.id, comment.creator
            ))
        })?;
        Ok(Some((comment, creator)))
    }

    fn save_comment(&self, comment: &Comment) -> RepoResult<()> {
        comment.validate()?;

        let changed = self.conn.execute(
            "UPDATE comments
             SET
                content = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![comment.id.to_string(), comment.content.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "comment",
                id: comment.id,
            });
        }
        Ok(())
    }
}

/// Write session over one `IMMEDIATE` SQLite transaction.
pub struct SqliteSession<'conn> {
    tx: Transaction<'conn>,
}

impl StoreSession for SqliteSession<'_> {
    fn insert_comment(&mut self, comment: &Comment) -> RepoResult<()> {
        comment.validate()?;

        self.tx.execute(
            "INSERT INTO comments (id, content, creator_id) VALUES (?1, ?2, ?3);",
            params![
                comment.id.to_string(),
                comment.content.as_str(),
                comment.creator.to_string(),
            ],
        )?;
        Ok(())
    }

    fn push_user_comment(&mut self, user_id: UserId, comment_id: CommentId) -> RepoResult<()> {
        let user_id_text = user_id.to_string();
        let exists: i64 = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id_text.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user_id,
            });
        }

        self.tx.execute(
            "INSERT INTO user_comments (user_id, comment_id, position)
             SELECT ?1, ?2, COALESCE(MAX(position), -1) + 1
             FROM user_comments
             WHERE user_id = ?1;",
            params![user_id_text, comment_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_comment(&mut self, comment_id: CommentId) -> RepoResult<()> {
        let changed = self
            .tx
            .execute("DELETE FROM comments WHERE id = ?1;", [comment_id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "comment",
                id: comment_id,
            });
        }
        Ok(())
    }

    fn pull_user_comment(&mut self, user_id: UserId, comment_id: CommentId) -> RepoResult<()> {
        let changed = self.tx.execute(
            "DELETE FROM user_comments WHERE user_id = ?1 AND comment_id = ?2;",
            params![user_id.to_string(), comment_id.to_string()],
        )?;
        if changed == 0 {
            debug!(
                "event=collection_pull module=repo status=noop user_id={} comment_id={}",
                user_id, comment_id
            );
        }
        Ok(())
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id_text: String = row.get("id")?;
    let creator_text: String = row.get("creator_id")?;
    let comment = Comment::with_id(
        parse_id(&id_text, "comments.id")?,
        row.get::<_, String>("content")?,
        parse_id(&creator_text, "comments.creator_id")?,
    );
    comment.validate()?;
    Ok(comment)
}

fn parse_id(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["users", "comments", "user_comments"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
