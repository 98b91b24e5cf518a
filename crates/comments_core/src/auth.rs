//! Request authentication gate.
//!
//! # Responsibility
//! - Resolve the authenticated user id from an `Authorization` header.
//! - Reject requests before any mutating comment use-case runs.
//!
//! # Invariants
//! - Tokens are opaque; nothing is derived from their text.
//! - A revoked token never authenticates again.

use crate::model::user::UserId;
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const MSG_AUTH_FAILED: &str = "Authentication failed!";

/// Reasons a request could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingCredentials,
    /// Header present but not `Bearer <token>`.
    MalformedCredentials,
    UnknownToken,
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        401
    }

    pub fn message(&self) -> &'static str {
        MSG_AUTH_FAILED
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::MalformedCredentials => "malformed_credentials",
            Self::UnknownToken => "unknown_token",
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "authorization header is missing"),
            Self::MalformedCredentials => {
                write!(f, "authorization header must use the Bearer scheme")
            }
            Self::UnknownToken => write!(f, "bearer token is not recognized"),
        }
    }
}

impl Error for AuthError {}

/// Resolves the caller of a request.
pub trait AuthGate {
    /// Returns the authenticated user for the raw `Authorization` header
    /// value, or rejects.
    fn authenticate(&self, authorization: Option<&str>) -> Result<UserId, AuthError>;
}

/// In-process registry of issued bearer tokens.
#[derive(Debug, Default)]
pub struct BearerTokenGate {
    tokens: BTreeMap<String, UserId>,
}

impl BearerTokenGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new opaque token for `user_id`.
    pub fn issue(&mut self, user_id: UserId) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user_id);
        token
    }

    /// Revokes a token. Returns whether it was active.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }
}

impl AuthGate for BearerTokenGate {
    fn authenticate(&self, authorization: Option<&str>) -> Result<UserId, AuthError> {
        let result = parse_bearer(authorization).and_then(|token| {
            self.tokens
                .get(token)
                .copied()
                .ok_or(AuthError::UnknownToken)
        });
        if let Err(err) = &result {
            debug!(
                "event=auth_check module=auth status=rejected error_code={}",
                err.code()
            );
        }
        result
    }
}

fn parse_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredentials)?;
    let (scheme, token) = header
        .split_once(char::is_whitespace)
        .ok_or(AuthError::MalformedCredentials)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedCredentials);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedCredentials);
    }
    Ok(token)
}
