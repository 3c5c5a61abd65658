// Request wrapper
//
// Handlers return plain values (or raise HttpError) and `wrap` turns the
// outcome into a transport response with a uniform error envelope.

use crate::error::{ApiError, HttpError};
use crate::json_safe::{to_json_value, IntoShape, Shape};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::future::Future;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ============================================================================
// REPLY
// ============================================================================

/// Successful handler outcome.
pub enum Reply {
    /// Already a transport response, passed through untouched
    Raw(Response),

    /// 204 with an empty body
    NoContent,

    /// JSON body, 200 unless the handler picked another status
    Json { status: StatusCode, body: Shape },
}

impl Reply {
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Reply::Json {
            status: StatusCode::OK,
            body: Shape::serialized(value),
        }
    }

    pub fn created<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Reply::Json {
            status: StatusCode::CREATED,
            body: Shape::serialized(value),
        }
    }

    pub fn shape(value: impl IntoShape) -> Self {
        Reply::Json {
            status: StatusCode::OK,
            body: value.into_shape(),
        }
    }

    pub fn no_content() -> Self {
        Reply::NoContent
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::NoContent
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Raw(response)
    }
}

impl From<Shape> for Reply {
    fn from(body: Shape) -> Self {
        Reply::Json {
            status: StatusCode::OK,
            body,
        }
    }
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response {
    let mut response = (status, body.to_string()).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Raw(response) => response,
            Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
            Reply::Json { status, body } => json_response(status, &to_json_value(body)),
        }
    }
}

// ============================================================================
// ERROR RENDERING
// ============================================================================

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        json_response(self.status(), &json!({ "error": self.to_payload() }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http(err) => err.into_response(),
            ApiError::Internal(err) => {
                tracing::error!(target: "jar_ledger::api", error = ?err, "unhandled error");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "error": { "message": "Internal Server Error" } }),
                )
            }
        }
    }
}

// ============================================================================
// WRAP
// ============================================================================

/// Run a handler body and normalize whatever it produces:
/// - a `Response` passes through
/// - `()` becomes 204 with no body
/// - any other reply is JSON
/// - `HttpError` becomes its status plus the error envelope
/// - everything else is logged and becomes a generic 500
pub async fn wrap<Fut, R>(handler: Fut) -> Response
where
    Fut: Future<Output = Result<R, ApiError>>,
    R: Into<Reply>,
{
    match handler.await {
        Ok(result) => result.into().into_response(),
        Err(err) => err.into_response(),
    }
}
