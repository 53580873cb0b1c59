//! Structured failure responses.
//!
//! Every failure leaves the server as `{"status": "fail", "kind": ..., "message": ...}`.
//! Server-side failures carry a generic message; details only go to the log.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gallery::{ErrorKind, GalleryError};
use serde::Serialize;
use tracing::{error, warn};

/// An error ready to be sent to a client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: Option<ErrorKind>,
    message: String,
}

/// Body of a failure response.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: None,
            message: message.into(),
        }
    }

    /// Fallback for unknown routes.
    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource not found.")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Replace the user-facing message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// Map a multipart decoding failure.
    pub fn from_multipart(err: MultipartError) -> Self {
        let status = err.status();
        warn!(error = %err.body_text(), "Rejected malformed upload");

        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self {
                status,
                kind: Some(ErrorKind::FileTooLarge),
                message: "File too large".to_string(),
            }
        } else {
            Self::new(StatusCode::BAD_REQUEST, "Malformed upload request.")
        }
    }
}

impl From<GalleryError> for ApiError {
    fn from(err: GalleryError) -> Self {
        let (status, message) = match &err {
            GalleryError::MissingFile => (StatusCode::BAD_REQUEST, "No selected file."),
            GalleryError::UnsupportedType(_) => {
                (StatusCode::BAD_REQUEST, "Unsupported file type.")
            }
            GalleryError::InvalidName(_) => (StatusCode::BAD_REQUEST, "Invalid file name."),
            GalleryError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "File too large"),
            GalleryError::NotFound(_) => (StatusCode::NOT_FOUND, "Image not found."),
            GalleryError::StorageUnavailable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            GalleryError::Persist { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save image.")
            }
        };

        if status.is_server_error() {
            let source = std::error::Error::source(&err)
                .map(ToString::to_string)
                .unwrap_or_default();
            error!(error = %err, source = %source, "Request failed");
        } else {
            warn!(error = %err, "Request rejected");
        }

        Self {
            status,
            kind: Some(err.kind()),
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = FailureBody {
            status: "fail",
            kind: self.kind,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}
