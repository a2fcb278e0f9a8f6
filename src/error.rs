use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// "Not found" deliberately covers both a missing row and a row the caller
/// has no claim on, so existence never leaks to outsiders.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("access token required")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("not found or unauthorized")]
    NotFound,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    /// Turns a unique-index violation into a 400 with the given message and
    /// leaves every other store failure as a 500.
    pub fn or_conflict(err: sqlx::Error, msg: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Validation(msg.to_owned())
            }
            _ => ApiError::Store(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::MissingToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::InvalidToken => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Store(err) => {
                error!("store failure: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "server error".to_owned())
            }
            ApiError::Internal(err) => {
                error!("internal failure: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "server error".to_owned())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
