//! Ephemeral storage for shareable results. Records live 7 days; ids are
//! caller-supplied and a colliding id silently overwrites the prior entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::AppError;
use crate::store::KvStore;

const SHARE_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Serialize, Deserialize)]
struct ShareRecord {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
    created_at: i64,
}

pub struct ShareStore {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl ShareStore {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn save(&self, id: &str, kind: &str, data: Value) -> Result<(), AppError> {
        let record = ShareRecord {
            kind: kind.to_string(),
            data,
            created_at: self.clock.now_utc().timestamp(),
        };
        let serialized = serde_json::to_string(&record)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        self.store
            .put_ex(&share_key(id), serialized, SHARE_TTL_SECS)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Stored `(type, data)` pair, or `None` once missing or expired.
    pub async fn get(&self, id: &str) -> Result<Option<(String, Value)>, AppError> {
        let raw = self
            .store
            .fetch(&share_key(id))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let record: ShareRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(_) => return Ok(None), // unreadable entry counts as absent
        };
        Ok(Some((record.kind, record.data)))
    }
}

fn share_key(id: &str) -> String {
    format!("share:{id}")
}
