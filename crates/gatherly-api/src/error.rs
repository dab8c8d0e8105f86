// Domain errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use gatherly_contracts::ErrorBody;

/// Errors surfaced by the event service.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event {0} not found")]
    NotFound(String),
    #[error("event {0} is already full")]
    Full(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Error response carrying the `{status, path, message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    path: String,
    message: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, path: &str, message: &'static str) -> Self {
        Self {
            status,
            path: path.to_string(),
            message,
        }
    }

    pub fn bad_request(path: &str, message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, path, message)
    }

    /// Map a service error onto the wire contract. Neither domain error is
    /// transient, so no retry hinting; storage failures are logged here and
    /// collapsed to a generic 500.
    pub fn from_event_error(err: EventError, path: &str) -> Self {
        match err {
            EventError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, path, "Event not found!"),
            EventError::Full(_) => Self::new(StatusCode::BAD_REQUEST, path, "Event full!"),
            EventError::Storage(err) => {
                tracing::error!(path, "storage error: {:#}", err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    path,
                    "Internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            path: self.path,
            message: self.message.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
