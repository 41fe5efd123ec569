use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    geocoding::GeocodeFailure,
    password::PasswordError,
    models::{ErrorBody, GeocodeResponse},
    repository::RepositoryError,
};

/// AppError
///
/// The single error type handlers and middleware return. Each variant maps to one
/// HTTP status; internal details are logged server-side and never sent to clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or rejected credentials (401).
    #[error("{0}")]
    Unauthorized(String),
    /// Valid identity, insufficient role (403).
    #[error("access denied")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    /// Malformed input or a violated field constraint (400).
    #[error("{0}")]
    Validation(String),
    /// Geocoding provider failure, rendered in the geocode response shape.
    #[error("geocoding failed: {0}")]
    Geocoding(GeocodeFailure),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("authentication required".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Geocoding(failure) => failure.status(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Geocoding(failure) => {
                (status, Json(GeocodeResponse::failure(failure.to_string()))).into_response()
            }
            AppError::Internal(detail) => {
                tracing::error!(%detail, "request failed with internal error");
                let body = ErrorBody {
                    error: "internal server error".to_string(),
                };
                (status, Json(body)).into_response()
            }
            other => {
                let body = ErrorBody {
                    error: other.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(what) => AppError::Validation(format!("{what} already exists")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<GeocodeFailure> for AppError {
    fn from(failure: GeocodeFailure) -> Self {
        AppError::Geocoding(failure)
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}
