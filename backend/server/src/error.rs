use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Todo {0} not found")]
    NotFound(u64),

    #[error("Todo id must be a positive integer")]
    InvalidId,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("No todo ids left to assign")]
    IdsExhausted,

    #[error("Todo list is too large to keep in a cookie")]
    CookieTooLarge,

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(id),
            StoreError::IdsExhausted => AppError::IdsExhausted,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidId => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            AppError::IdsExhausted => StatusCode::CONFLICT,
            AppError::CookieTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InternalError { .. } => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
