use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{admit, run_generation};
use crate::error::AppError;
use crate::prompts;
use crate::state::AppState;

pub async fn fortune_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;
    run_generation(&state, &ip, "/api/v1/fortune", json!({}), prompts::fortune()).await
}
