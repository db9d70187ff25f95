use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{admit, run_generation};
use crate::error::AppError;
use crate::models::ExcuseRequest;
use crate::prompts;
use crate::state::AppState;
use crate::util::clip;

pub async fn excuse_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ExcuseRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;

    let situation = payload
        .situation
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Please provide a situation".to_string()))?;
    let believability = payload.believability.unwrap_or(50).clamp(0, 100);

    let prompt = prompts::excuse(clip(&situation, 500), believability);
    run_generation(
        &state,
        &ip,
        "/api/v1/excuse",
        json!({ "situation": situation, "believability": believability }),
        prompt,
    )
    .await
}
