//! Request boundary for the comments resource.
//!
//! # Responsibility
//! - Accept raw path parameters, body fields and `Authorization` values.
//! - Authenticate mutating calls, validate input, call the service.
//! - Map every outcome to a status code and a JSON body.
//!
//! # Invariants
//! - Create/update/delete never reach the service unauthenticated.
//! - Every failure yields `{ "message": ... }`; no partial results.

use crate::auth::{AuthError, AuthGate};
use crate::model::comment::validate_content;
use crate::repo::document_store::DocumentStore;
use crate::service::comment_service::{
    CommentService, CommentServiceError, MSG_COMMENT_NOT_FOUND, MSG_DELETE_NOT_FOUND,
    MSG_INVALID_INPUT, MSG_LIST_NOT_FOUND,
};
use log::debug;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const MSG_DELETED: &str = "Deleted comment.";

/// Status code plus JSON body returned to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::new(status, json!({ "message": message }))
    }

    /// Returns whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<CommentServiceError> for ApiResponse {
    fn from(value: CommentServiceError) -> Self {
        Self::error(value.status_code(), value.message())
    }
}

impl From<AuthError> for ApiResponse {
    fn from(value: AuthError) -> Self {
        Self::error(value.status_code(), value.message())
    }
}

/// Comments resource handlers over an injected store and auth gate.
pub struct CommentsApi<S: DocumentStore, A: AuthGate> {
    service: CommentService<S>,
    gate: A,
}

impl<S: DocumentStore, A: AuthGate> CommentsApi<S, A> {
    pub fn new(store: S, gate: A) -> Self {
        Self {
            service: CommentService::new(store),
            gate,
        }
    }

    pub fn service(&self) -> &CommentService<S> {
        &self.service
    }

    /// Mutable access to the gate, e.g. to issue or revoke tokens.
    pub fn gate_mut(&mut self) -> &mut A {
        &mut self.gate
    }

    /// `GET /:cid`
    pub fn get_comment(&self, comment_id: &str) -> ApiResponse {
        let Some(comment_id) = parse_path_id(comment_id) else {
            return ApiResponse::error(404, MSG_COMMENT_NOT_FOUND);
        };
        let response = match self.service.get_by_id(comment_id) {
            Ok(comment) => ApiResponse::new(200, json!({ "comment": comment })),
            Err(err) => err.into(),
        };
        log_response("get", &response);
        response
    }

    /// `GET /user/:uid`
    pub fn list_user_comments(&self, user_id: &str) -> ApiResponse {
        let Some(user_id) = parse_path_id(user_id) else {
            return ApiResponse::error(404, MSG_LIST_NOT_FOUND);
        };
        let response = match self.service.list_by_user(user_id) {
            Ok(comments) => ApiResponse::new(200, json!({ "comments": comments })),
            Err(err) => err.into(),
        };
        log_response("list", &response);
        response
    }

    /// `POST /` with body field `content`.
    pub fn create_comment(&self, authorization: Option<&str>, content: Option<&str>) -> ApiResponse {
        let user_id = match self.gate.authenticate(authorization) {
            Ok(user_id) => user_id,
            Err(err) => return err.into(),
        };
        let Some(content) = valid_content(content) else {
            return ApiResponse::error(422, MSG_INVALID_INPUT);
        };
        let response = match self.service.create(content, user_id) {
            Ok(comment) => ApiResponse::new(201, json!({ "comment": comment })),
            Err(err) => err.into(),
        };
        log_response("create", &response);
        response
    }

    /// `PATCH /:cid` with body field `content`.
    pub fn update_comment(
        &self,
        authorization: Option<&str>,
        comment_id: &str,
        content: Option<&str>,
    ) -> ApiResponse {
        let user_id = match self.gate.authenticate(authorization) {
            Ok(user_id) => user_id,
            Err(err) => return err.into(),
        };
        let Some(content) = valid_content(content) else {
            return ApiResponse::error(422, MSG_INVALID_INPUT);
        };
        let Some(comment_id) = parse_path_id(comment_id) else {
            return ApiResponse::error(404, MSG_COMMENT_NOT_FOUND);
        };
        let response = match self.service.update(comment_id, content, user_id) {
            Ok(comment) => ApiResponse::new(200, json!({ "comment": comment })),
            Err(err) => err.into(),
        };
        log_response("update", &response);
        response
    }

    /// `DELETE /:cid`
    pub fn delete_comment(&self, authorization: Option<&str>, comment_id: &str) -> ApiResponse {
        let user_id = match self.gate.authenticate(authorization) {
            Ok(user_id) => user_id,
            Err(err) => return err.into(),
        };
        let Some(comment_id) = parse_path_id(comment_id) else {
            return ApiResponse::error(404, MSG_DELETE_NOT_FOUND);
        };
        let response = match self.service.delete(comment_id, user_id) {
            Ok(()) => ApiResponse::new(200, json!({ "message": MSG_DELETED })),
            Err(err) => err.into(),
        };
        log_response("delete", &response);
        response
    }
}

/// Ids that are not UUIDs cannot name a stored record.
fn parse_path_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

fn valid_content(content: Option<&str>) -> Option<&str> {
    content.filter(|value| validate_content(value).is_ok())
}

fn log_response(op: &str, response: &ApiResponse) {
    debug!(
        "event=api_response module=api op={} status_code={}",
        op, response.status
    );
}
