use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{ShareQuery, ShareRequest};
use crate::state::AppState;
use crate::util::short_id;

pub async fn share_save_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Value>, AppError> {
    let (kind, data) = match (payload.kind.filter(|k| !k.is_empty()), payload.data) {
        (Some(kind), Some(data)) => (kind, data),
        _ => return Err(AppError::BadRequest("Missing type or data".to_string())),
    };

    let id = short_id();
    state.share.save(&id, &kind, data).await?;

    Ok(Json(json!({ "id": id, "url": format!("/s/{id}") })))
}

pub async fn share_get_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<Value>, AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing id".to_string()))?;

    let (kind, data) = state.share.get(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(json!({ "type": kind, "data": data })))
}
