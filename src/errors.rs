use crate::services::{
    assets::AssetError, auth::AuthError, blob_store::BlobError, media::MediaError,
    video_repository::RepoError,
};
use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Log the full cause and hide it behind a generic message.
    pub fn internal_from(context: &str, err: impl fmt::Display) -> Self {
        tracing::error!(error = %err, "{}", context);
        Self::internal(context)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        tracing::warn!(error = %err, "rejected credentials");
        match err {
            AuthError::MissingHeader | AuthError::MalformedHeader => {
                AppError::unauthorized("Couldn't find JWT")
            }
            AuthError::InvalidToken(_) | AuthError::InvalidSubject(_) => {
                AppError::unauthorized("Couldn't validate JWT")
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            missing @ RepoError::VideoNotFound(_) => {
                AppError::internal_from("Couldn't get video", missing)
            }
            RepoError::Sqlx(e) => AppError::internal_from("Couldn't access video metadata", e),
        }
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::InvalidMediaType(_) | AssetError::UnsupportedMediaType(_) => {
                AppError::bad_request("Invalid media type")
            }
            AssetError::Io(e) => AppError::internal_from("Couldn't store file", e),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        let context = match err {
            MediaError::NoStreams | MediaError::ProbeFailed(_) | MediaError::ProbeOutput(_) => {
                "Couldn't get video aspect ratio"
            }
            MediaError::RemuxFailed(_) => "Couldn't process video",
            MediaError::Spawn { .. } => "Couldn't run media tool",
        };
        AppError::internal_from(context, err)
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        AppError::internal_from("Couldn't upload file to object storage", err)
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        tracing::debug!(error = %err, "multipart rejection");
        AppError::bad_request("Unable to parse form file")
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::debug!(error = %err, status = %err.status(), "multipart read failed");
        AppError::bad_request("Unable to parse form file")
    }
}
