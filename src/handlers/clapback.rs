use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{admit, run_generation};
use crate::error::AppError;
use crate::models::ClapbackRequest;
use crate::prompts;
use crate::state::AppState;
use crate::util::clip;

pub async fn clapback_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ClapbackRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;

    let roast = payload
        .roast
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Please provide the roast you received".to_string()))?;

    let prompt = prompts::clapback(clip(&roast, 1000));
    run_generation(
        &state,
        &ip,
        "/api/v1/clapback",
        json!({ "roast": roast }),
        prompt,
    )
    .await
}
