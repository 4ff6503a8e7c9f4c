use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use studybuddy_core::StudyBuddyError;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("领域错误: {0}")]
    Domain(#[from] StudyBuddyError),

    #[error("验证错误: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("权限不足")]
    Forbidden,

    #[error("未找到资源")]
    NotFound,

    #[error("请求过于频繁")]
    TooManyRequests,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type) = match &self {
            ApiError::Domain(StudyBuddyError::TaskNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("Task {id} not found."),
                "TASK_NOT_FOUND",
            ),
            ApiError::Domain(StudyBuddyError::UserNotFound(_)) => (
                StatusCode::NOT_FOUND,
                "User not found".to_string(),
                "USER_NOT_FOUND",
            ),
            ApiError::Domain(StudyBuddyError::ValidationError(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_ERROR")
            }
            ApiError::Domain(StudyBuddyError::Authentication(msg)) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "AUTHENTICATION_ERROR")
            }
            ApiError::Domain(err) => {
                error!("内部错误: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                format_validation_errors(errors),
                "VALIDATION_ERROR",
            ),
            ApiError::Auth(err) => (
                StatusCode::from(*err),
                err.to_string(),
                "AUTHENTICATION_ERROR",
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "BAD_REQUEST"),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "UNAUTHORIZED")
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Forbidden".to_string(),
                "FORBIDDEN",
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "Resource not found".to_string(),
                "NOT_FOUND",
            ),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, please try again later.".to_string(),
                "TOO_MANY_REQUESTS",
            ),
            ApiError::Internal(msg) => {
                error!("内部服务器错误: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "code": error_type,
            "timestamp": chrono::Utc::now(),
        }));

        (status, body).into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid value for field '{field}'"),
            })
        })
        .collect();

    if messages.is_empty() {
        "Invalid request".to_string()
    } else {
        messages.join("; ")
    }
}
