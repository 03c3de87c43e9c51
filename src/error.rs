use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{models::ValidationErrors, store::StoreError};

pub const NOT_FOUND_MESSAGE: &str = "Película no encontrada";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No movie with that id, or the id is not a valid object id.
    #[error("Película no encontrada")]
    NotFound,

    #[error(transparent)]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => Self::Validation(errors),
            other => Self::Store(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": NOT_FOUND_MESSAGE })))
                    .into_response()
            }
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            AppError::Store(err) => {
                tracing::error!(error = %err, "persistence failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
