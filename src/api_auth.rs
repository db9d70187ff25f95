//! Metered API tier: a static allow-list loaded once at startup plus a
//! per-key monthly counter. Both backends key the window by calendar month
//! (`api:<key>:<YYYY-MM>`), so the quota resets on the month boundary.

use axum::http::HeaderMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::clock::Clock;
use crate::error::AppError;
use crate::store::{KvStore, MemoryStore, StoreError};

pub const API_KEY_HEADER: &str = "x-api-key";

// Outlives the longest month so the counter expires only after the window
const MONTH_TTL_SECS: i64 = 32 * 24 * 60 * 60;

pub struct ApiKeyAuth {
    keys: HashSet<String>,
    store: Arc<dyn KvStore>,
    fallback: MemoryStore,
    clock: Arc<dyn Clock>,
    monthly_limit: u32,
}

impl ApiKeyAuth {
    pub fn new(
        keys: Vec<String>,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        monthly_limit: u32,
    ) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            store,
            fallback: MemoryStore::new(clock.clone()),
            clock,
            monthly_limit,
        }
    }

    /// Presence of the header switches a request into the metered tier.
    pub fn is_api_request(&self, headers: &HeaderMap) -> bool {
        headers.contains_key(API_KEY_HEADER)
    }

    /// Validate the key and consume one call from its monthly quota.
    /// Missing header, unknown key and exhausted quota each get a distinct
    /// message so clients can tell them apart.
    pub async fn validate(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing x-api-key header".to_string()))?;

        if !self.keys.contains(key) {
            return Err(AppError::Unauthorized("Invalid API key".to_string()));
        }

        match self.meter(self.store.as_ref(), key).await {
            Ok(admitted) => admitted,
            Err(err) => {
                warn!("usage meter backend unavailable, using in-memory fallback: {err}");
                self.meter(&self.fallback, key)
                    .await
                    .unwrap_or(Ok(key.to_string()))
            }
        }
    }

    async fn meter(
        &self,
        store: &dyn KvStore,
        key: &str,
    ) -> Result<Result<String, AppError>, StoreError> {
        let month = self.clock.now_utc().format("%Y-%m").to_string();
        let usage_key = format!("api:{key}:{month}");

        let used = store.get_count(&usage_key).await?;
        if used >= u64::from(self.monthly_limit) {
            // over the ceiling: reject without incrementing further
            return Ok(Err(AppError::QuotaExceeded(format!(
                "Monthly API limit exceeded ({} calls/month)",
                self.monthly_limit
            ))));
        }

        store.incr_expire(&[&usage_key], MONTH_TTL_SECS).await?;
        Ok(Ok(key.to_string()))
    }
}
