use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::ai::AiError;

#[derive(Error, Debug)]
pub enum AppError {
    // Missing or malformed input, message is shown to the user as-is
    #[error("{0}")]
    BadRequest(String),

    // Anonymous tier exhausted, either this caller's daily quota or the
    // site-wide daily cap
    #[error("Rate limit exceeded")]
    RateLimited { global_cap: bool },

    #[error("{0}")]
    Unauthorized(String),

    // Metered API tier over its monthly ceiling
    #[error("{0}")]
    QuotaExceeded(String),

    #[error("Not found or expired")]
    NotFound,

    #[error("generation failed: {0}")]
    Upstream(String),

    #[error("storage failed: {0}")]
    Internal(String),
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::RateLimited { global_cap } => {
                let message = if *global_cap {
                    "The whole pond hit today's global limit. The duck needs a nap — try again tomorrow."
                } else {
                    "You've used all your free requests today. Come back tomorrow, or get an API key for more! 🦆"
                };
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    json!({ "error": "Rate limit exceeded", "message": message }),
                )
            }
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": message }))
            }
            AppError::QuotaExceeded(message) => {
                (StatusCode::TOO_MANY_REQUESTS, json!({ "error": message }))
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Not found or expired" }),
            ),
            AppError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "The duck is temporarily out of order. Try again in a bit." }),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Something went wrong on our end." }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
