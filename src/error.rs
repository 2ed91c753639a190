//! Panel error types with HTTP status code mapping.
//!
//! [`PanelError`] is shared by both halves of the crate: the dashboard side
//! (envelope parsing, the shared connection) and the device side (command
//! application, the REST API). Only the device side ever turns an error into
//! an HTTP response; the dashboard side logs and carries on.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "unknown command: 9",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Crate-wide error enum.
///
/// None of these are fatal. The worst a dashboard user sees is a widget
/// holding a stale or placeholder value.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Payload/Request | 400 Bad Request           |
/// | 2000–2999 | Not Found       | 404 Not Found             |
/// | 3000–3999 | Server          | 500 Internal Server Error |
/// | 5000–5999 | Connection      | 503 Service Unavailable   |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Inbound or outbound text is not a well-formed envelope.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The device does not understand the command code.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command names a signal the device does not have.
    #[error("unknown signal: {0}")]
    UnknownSignal(String),

    /// Endpoint is not a `ws://` or `wss://` URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A command was sent while the connection was not open. It was dropped.
    #[error("connection not open; command dropped")]
    SendBeforeOpen,

    /// The underlying connection failed or closed.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PanelError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedPayload(_) => 1001,
            Self::UnknownCommand(_) => 1002,
            Self::InvalidEndpoint(_) => 1003,
            Self::UnknownSignal(_) => 2001,
            Self::Internal(_) => 3000,
            Self::SendBeforeOpen => 5001,
            Self::ConnectionLost(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_) | Self::UnknownCommand(_) | Self::InvalidEndpoint(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnknownSignal(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SendBeforeOpen | Self::ConnectionLost(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
