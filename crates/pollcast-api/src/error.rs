use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pollcast_core::error::CoreError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    BadRequest {
        code: &'static str,
        message: String,
    },
    #[error("storage unavailable, please retry")]
    StorageUnavailable,
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: "INVALID_INPUT",
            message: message.into(),
        }
    }

    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest { code, .. } => code,
            ApiError::StorageUnavailable => "STORAGE_UNAVAILABLE",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::StorageUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let message = self.to_string();

        let body = json!({
            "code": code,
            "message": message,
            "error": message,
            "details": Value::Null,
        });

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidInput(msg) => ApiError::invalid_input(msg),
            CoreError::DuplicateVote => ApiError::BadRequest {
                code: "DUPLICATE_VOTE",
                message: e.to_string(),
            },
            CoreError::InvalidOption(msg) => ApiError::BadRequest {
                code: "INVALID_OPTION",
                message: msg,
            },
            CoreError::MultipleAnswersNotAllowed => ApiError::BadRequest {
                code: "MULTIPLE_ANSWERS_NOT_ALLOWED",
                message: e.to_string(),
            },
            CoreError::NotFound => ApiError::NotFound(e.to_string()),
            CoreError::StorageUnavailable(err) => {
                tracing::error!("storage failure: {err}");
                ApiError::StorageUnavailable
            }
            CoreError::WriteContention => {
                tracing::warn!("vote abandoned after repeated write conflicts");
                ApiError::StorageUnavailable
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}
