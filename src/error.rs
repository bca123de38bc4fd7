use axum::Json;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

pub const ERR_CODE_BLOB_UNKNOWN: &str = "BLOB_UNKNOWN";
pub const ERR_CODE_MANIFEST_INVALID: &str = "MANIFEST_INVALID";

/// One entry of an OCI wire-protocol error response.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

/// Body shape of `{"errors":[{"code":...,"message":...}]}` responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorInfo>,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        ErrorResponse {
            errors: vec![ErrorInfo {
                code,
                message: message.into(),
            }],
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("blob unknown: {0}")]
    BlobUnknown(String),

    #[error("manifest invalid: {0}")]
    ManifestInvalid(String),

    #[error("request entity too large")]
    PayloadTooLarge,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Storage(StorageError::NotFound) => {
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            AppError::Storage(StorageError::SessionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "session not found").into_response()
            }
            AppError::Storage(err @ StorageError::OutOfOrderChunk { .. }) => {
                tracing::debug!(error = %err, "out-of-order chunk received");
                StatusCode::RANGE_NOT_SATISFIABLE.into_response()
            }
            AppError::Storage(err @ StorageError::DigestMismatch { .. }) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(ERR_CODE_MANIFEST_INVALID, err.to_string())),
            )
                .into_response(),
            AppError::Storage(StorageError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            AppError::Storage(StorageError::Io(err)) => {
                tracing::error!(error = %err, "storage I/O failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AppError::BlobUnknown(digest) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    ERR_CODE_BLOB_UNKNOWN,
                    format!("blob unknown: {digest}"),
                )),
            )
                .into_response(),
            AppError::ManifestInvalid(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(ERR_CODE_MANIFEST_INVALID, msg)),
            )
                .into_response(),
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE.into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response(),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("internal server error"))
                    .unwrap()
            }
        }
    }
}
