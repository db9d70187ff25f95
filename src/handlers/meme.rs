use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{admit, run_generation};
use crate::error::AppError;
use crate::models::MemeRequest;
use crate::prompts;
use crate::state::AppState;
use crate::util::clip;

pub async fn meme_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MemeRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;

    let template = payload
        .template
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Please select a meme template".to_string()))?;
    let context = payload.context.as_deref().map(|c| clip(c, 200));

    let prompt = prompts::meme(clip(&template, 100), context);
    run_generation(
        &state,
        &ip,
        "/api/v1/meme",
        json!({ "template": template, "context": payload.context }),
        prompt,
    )
    .await
}
