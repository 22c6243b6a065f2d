use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use larder_core::{ImageError, ValidationError};
use thiserror::Error;

use super::ErrorResponse;
use crate::accounts::AccountError;
use crate::media::MediaError;
use crate::store::StoreError;

const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Errors a handler can return. Every variant renders as an [`ErrorResponse`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unable to authenticate with provided credentials.")]
    InvalidCredentials,

    /// A request that could not be read, with the status the reader chose.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_fields("Invalid input.", e.into_fields())),
            )
                .into_response(),
            ApiError::InvalidCredentials => {
                let fields = ValidationError::field("non_field_errors", INVALID_CREDENTIALS);
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::with_fields(
                        INVALID_CREDENTIALS,
                        fields.into_fields(),
                    )),
                )
                    .into_response()
            }
            ApiError::Rejected { status, message } => {
                (status, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found."))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::DuplicateEmail => ApiError::Validation(ValidationError::field(
                "email",
                "user with this email already exists.",
            )),
            StoreError::UnknownIds { field, ids } => {
                let mut errors = ValidationError::new();
                for id in ids {
                    errors.add(field, format!("Invalid pk \"{id}\" - object does not exist."));
                }
                ApiError::Validation(errors)
            }
            e @ (StoreError::Pool(_) | StoreError::Database(_)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(e) => ApiError::Validation(e),
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::Store(e) => e.into(),
            e @ AccountError::Hash(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        ApiError::Validation(ValidationError::field("image", e.to_string()))
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        tracing::warn!("Multipart read error: {}", e);
        let message = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            format!(
                "File too large. Maximum size is {} bytes",
                larder_core::MAX_FILE_SIZE
            )
        } else {
            format!("Failed to read multipart data: {}", e.body_text())
        };
        ApiError::Rejected {
            status: e.status(),
            message,
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Type mismatches are reported as 400 rather than axum's 422.
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            status => status,
        };
        ApiError::Rejected {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        // Ids that do not parse cannot name a row.
        tracing::debug!("Path rejected: {}", rejection.body_text());
        ApiError::NotFound
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// `Json` whose rejections are [`ApiError`]s.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Multipart` whose rejections are [`ApiError`]s.
#[derive(FromRequest)]
#[from_request(rejection(ApiError))]
pub struct AppMultipart(pub axum::extract::Multipart);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
