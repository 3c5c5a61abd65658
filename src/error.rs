// Access-denial signal and handler error type
//
// HttpError is the only error that crosses layer boundaries on purpose.
// Everything else a handler raises is an internal failure and gets the
// generic 500 treatment from the request wrapper.

use crate::json_safe::{to_json_value, IntoShape};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// DENIAL KIND (closed set)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// No resolvable identity (401)
    Unauthenticated,

    /// Identity resolved but not allowed (403)
    Forbidden,

    /// Addressed resource does not exist (404)
    NotFound,

    /// Request payload failed validation (400)
    BadInput,
}

impl DenialKind {
    pub fn status(&self) -> StatusCode {
        match self {
            DenialKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            DenialKind::Forbidden => StatusCode::FORBIDDEN,
            DenialKind::NotFound => StatusCode::NOT_FOUND,
            DenialKind::BadInput => StatusCode::BAD_REQUEST,
        }
    }
}

// ============================================================================
// HTTP ERROR
// ============================================================================

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    pub kind: DenialKind,
    pub message: String,
    pub code: Option<String>,
    pub details: Option<Value>,
}

impl HttpError {
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        HttpError {
            kind,
            message: message.into(),
            code: None,
            details: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach details; they go through the same JSON-safe conversion as
    /// response bodies.
    pub fn with_details(mut self, details: impl IntoShape) -> Self {
        self.details = Some(to_json_value(details.into_shape()));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Body of the `error` key in the envelope.
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("message".to_string(), Value::from(self.message.clone()));
        payload.insert("status".to_string(), Value::from(self.status().as_u16()));
        if let Some(code) = &self.code {
            payload.insert("code".to_string(), Value::from(code.clone()));
        }
        if let Some(details) = &self.details {
            payload.insert("details".to_string(), details.clone());
        }
        Value::Object(payload)
    }
}

/// 400 with code `BAD_REQUEST`.
pub fn bad_request(message: Option<&str>) -> HttpError {
    HttpError::new(DenialKind::BadInput, message.unwrap_or("Bad Request")).with_code("BAD_REQUEST")
}

/// 401 with code `UNAUTHORIZED`.
pub fn unauthorized(message: Option<&str>) -> HttpError {
    HttpError::new(DenialKind::Unauthenticated, message.unwrap_or("Unauthorized"))
        .with_code("UNAUTHORIZED")
}

/// 403 with code `FORBIDDEN`.
pub fn forbidden(message: Option<&str>) -> HttpError {
    HttpError::new(DenialKind::Forbidden, message.unwrap_or("Forbidden")).with_code("FORBIDDEN")
}

/// 400 with code `VALIDATION_ERROR`, used when a payload or query fails
/// its shape checks.
pub fn validation_error(details: impl Into<String>) -> HttpError {
    HttpError::new(DenialKind::BadInput, "Invalid request")
        .with_code("VALIDATION_ERROR")
        .with_details(details.into())
}

// ============================================================================
// API ERROR
// ============================================================================

/// What a wrapped handler may fail with.
///
/// The split between the two variants is the whole expected/unexpected
/// distinction; messages are never inspected.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
