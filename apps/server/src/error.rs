use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookdrive_core::constants::GENERIC_ALLOCATION_FAILURE;
use bookdrive_core::errors::Error as CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

/// Status and client-facing message for a core error.
///
/// Fatal errors never expose their details.
fn core_status(err: &CoreError) -> (StatusCode, String) {
    match err {
        CoreError::Allocation(e) if err.is_fatal() => {
            tracing::error!("Allocation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_ALLOCATION_FAILURE.to_string(),
            )
        }
        CoreError::Allocation(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
        CoreError::Allocation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        CoreError::Donation(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
        CoreError::Donation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ => {
            tracing::error!("Request failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::Core(e) => core_status(e),
            ApiError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
            ApiError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.clone()),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
