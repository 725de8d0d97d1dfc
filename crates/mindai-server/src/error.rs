//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mindai_core::MindError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnsupportedModel(String),

    #[error("{0}")]
    Provider(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedModel(_) | Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MindError> for ApiError {
    fn from(err: MindError) -> Self {
        match err {
            MindError::UnknownProvider(name) => Self::UnsupportedModel(format!("Unsupported model: {}", name)),
            MindError::EmptyRequest => Self::BadRequest(MindError::EmptyRequest.to_string()),
            other => Self::Provider(other.user_message()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match &self {
            ApiError::Provider(msg) => error!(message = %msg, "Provider call failed"),
            _ => tracing::debug!(message = %message, "Client error"),
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
