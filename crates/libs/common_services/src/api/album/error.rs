use crate::database::DbError;
use crate::sharing::SharingClientError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use color_eyre::eyre;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("Database error")]
    Database(DbError),

    #[error("internal error")]
    Internal(#[from] eyre::Report),

    /// Malformed or contradictory input, e.g. sharing an album with its owner.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A required-access check failed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The sharing authority does not consider the principal the original owner.
    #[error("User is not the original owner of album(s): {}", .0.join(", "))]
    NotOriginalOwner(Vec<String>),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote server error: {0}")]
    RemoteServerError(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

fn log_error(error: &AlbumError) {
    match error {
        AlbumError::Database(e) => warn!("Database query failed: {}", e),
        AlbumError::Internal(e) => warn!("Internal error: {:?}", e),
        AlbumError::Validation(message) => warn!("Album -> Validation failed: {}", message),
        AlbumError::NotFound(message) => warn!("Album -> Not found: {}", message),
        AlbumError::Forbidden(message) => warn!("Album -> Forbidden: {}", message),
        AlbumError::NotOriginalOwner(album_ids) => {
            warn!("Album -> Not original owner of: {:?}", album_ids);
        }
        AlbumError::Configuration(message) => warn!("Album -> Configuration: {}", message),
        AlbumError::RemoteServerError(message) => {
            warn!("Album sharing -> Remote server error: {}", message);
        }
        AlbumError::Conflict(message) => warn!("Album -> Conflict: {}", message),
    }
}

impl IntoResponse for AlbumError {
    fn into_response(self) -> Response {
        log_error(&self);

        let (status, error_message) = match self {
            Self::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "A database error occurred.".to_string(),
            ),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected internal error occurred.".to_string(),
            ),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, format!("Forbidden: {message}")),
            err @ Self::NotOriginalOwner(_) => (StatusCode::FORBIDDEN, err.to_string()),
            Self::Configuration(message) => (StatusCode::BAD_REQUEST, message),
            Self::RemoteServerError(message) => (StatusCode::BAD_GATEWAY, message),
            Self::Conflict(message) => (StatusCode::CONFLICT, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<DbError> for AlbumError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(message) => Self::NotFound(message),
            DbError::UniqueViolation(message) => Self::Conflict(message),
            err @ DbError::Sqlx(_) => Self::Database(err),
        }
    }
}

impl From<SharingClientError> for AlbumError {
    fn from(err: SharingClientError) -> Self {
        match err {
            SharingClientError::NotConfigured(_) | SharingClientError::InvalidEndpoint { .. } => {
                Self::Configuration(err.to_string())
            }
            other => Self::RemoteServerError(other.detail()),
        }
    }
}
