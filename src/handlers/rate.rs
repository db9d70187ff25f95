use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{admit, run_generation};
use crate::error::AppError;
use crate::models::RateRequest;
use crate::prompts;
use crate::state::AppState;
use crate::util::clip;

pub async fn rate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RateRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;

    let decision = payload
        .decision
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Please describe your decision".to_string()))?;

    let prompt = prompts::rate(clip(&decision, 500));
    run_generation(
        &state,
        &ip,
        "/api/v1/rate",
        json!({ "decision": decision }),
        prompt,
    )
    .await
}
