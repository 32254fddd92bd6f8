//! HTTP errors and their JSON bodies

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::{error, warn};
use walksched_api::{ErrorCode, ErrorInfo};
use walksched_core::CoreError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Store(_) | HttpError::Internal(_) | HttpError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            HttpError::BadRequest(_) => ErrorCode::InvalidRequest,
            HttpError::NotFound(_) => ErrorCode::WalkNotFound,
            HttpError::Store(_) => ErrorCode::StoreError,
            HttpError::Internal(_) | HttpError::Io(_) => ErrorCode::InternalError,
        }
    }
}

impl From<CoreError> for HttpError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(e) => HttpError::BadRequest(e.to_string()),
            CoreError::Store(e) => HttpError::Store(e.to_string()),
            CoreError::Internal(msg) => HttpError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::BadRequest(rejection.body_text())
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorInfo::new(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
