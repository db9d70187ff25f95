//! Fire-and-forget request/response recorder. Writes one uniquely keyed
//! entry and bumps a per-day aggregate counter, both with a 30-day TTL.
//! Failures are swallowed; this side channel must never touch the primary
//! request path. Entirely a no-op when no remote backend is configured.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::clock::Clock;
use crate::store::{KvStore, StoreError};
use crate::util::short_id;

const AUDIT_TTL_SECS: i64 = 30 * 24 * 60 * 60;
const MAX_INPUT_BYTES: usize = 1024;
const MAX_OUTPUT_BYTES: usize = 2048;

#[derive(Serialize)]
struct AuditEntry {
    ip: String,
    endpoint: String,
    input: Value,
    output: Value,
    ts: String,
    ms: u64,
}

#[derive(Clone)]
pub struct AuditLogger {
    store: Option<Arc<dyn KvStore>>,
    clock: Arc<dyn Clock>,
}

impl AuditLogger {
    pub fn new(store: Option<Arc<dyn KvStore>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record one request/response pair. Returns immediately; the write runs
    /// in a detached task and any error is logged and dropped.
    pub fn log(&self, ip: &str, endpoint: &str, input: Value, output: Value, duration_ms: u64) {
        let Some(store) = self.store.clone() else {
            return;
        };

        let entry = AuditEntry {
            ip: ip.to_string(),
            endpoint: endpoint.to_string(),
            input: truncate_value(input, MAX_INPUT_BYTES),
            output: truncate_value(output, MAX_OUTPUT_BYTES),
            ts: self.clock.now_utc().to_rfc3339(),
            ms: duration_ms,
        };
        let day = self.clock.now_utc().format("%Y-%m-%d").to_string();

        tokio::spawn(async move {
            if let Err(err) = write_entry(store.as_ref(), &day, &entry).await {
                warn!("audit write failed (ignored): {err}");
            }
        });
    }
}

async fn write_entry(store: &dyn KvStore, day: &str, entry: &AuditEntry) -> Result<(), StoreError> {
    // randomized suffix so entries in the same millisecond can't collide
    let key = format!("audit:{day}:{}", short_id());
    let serialized = serde_json::to_string(entry).unwrap_or_default();
    store.put_ex(&key, serialized, AUDIT_TTL_SECS).await?;

    let counter_key = format!("audit:count:{day}");
    store.incr_expire(&[&counter_key], AUDIT_TTL_SECS).await?;
    Ok(())
}

// Byte-length truncation of the serialized form. May cut mid-structure;
// the entry is for human inspection, not replay.
fn truncate_value(value: Value, max_bytes: usize) -> Value {
    let serialized = match &value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if serialized.len() <= max_bytes {
        return value;
    }
    let cut = crate::util::clip(&serialized, max_bytes);
    Value::String(format!("{cut}...[truncated]"))
}
