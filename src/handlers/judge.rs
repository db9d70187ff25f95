use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{admit, run_generation};
use crate::error::AppError;
use crate::models::JudgeRequest;
use crate::prompts;
use crate::state::AppState;
use crate::util::clip;

pub async fn judge_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<JudgeRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;

    let (side_a, side_b) = match (
        payload.side_a.filter(|s| !s.is_empty()),
        payload.side_b.filter(|s| !s.is_empty()),
    ) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(AppError::BadRequest(
                "Both sides of the argument are required".to_string(),
            ));
        }
    };

    let prompt = prompts::judge(clip(&side_a, 500), clip(&side_b, 500));
    run_generation(
        &state,
        &ip,
        "/api/v1/judge",
        json!({ "sideA": side_a, "sideB": side_b }),
        prompt,
    )
    .await
}
