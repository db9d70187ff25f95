mod clapback;
mod dare;
mod excuse;
mod fortune;
mod health;
mod judge;
mod meme;
mod metrics;
mod rate;
mod roast;
mod share;

pub use clapback::clapback_handler;
pub use dare::dare_handler;
pub use excuse::excuse_handler;
pub use fortune::fortune_handler;
pub use health::health_handler;
pub use judge::judge_handler;
pub use meme::meme_handler;
pub use metrics::metrics_handler;
pub use rate::rate_handler;
pub use roast::roast_handler;
pub use share::{share_get_handler, share_save_handler};

use axum::Json;
use axum::http::HeaderMap;
use serde_json::Value;
use std::time::Instant;

use crate::error::AppError;
use crate::metrics::{GLOBAL_CAP_TOTAL, RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::state::AppState;

/// First x-forwarded-for element, then x-real-ip, then loopback. The value is
/// not validated, so it is spoofable without a trusted proxy in front.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

/// Shared admission step for every AI endpoint: an x-api-key header routes
/// into the metered monthly tier, anything else goes through the anonymous
/// per-IP/global daily limiter.
pub(crate) async fn admit(state: &AppState, headers: &HeaderMap) -> Result<String, AppError> {
    REQUEST_TOTAL.inc();
    let ip = client_ip(headers);

    if state.auth.is_api_request(headers) {
        state.auth.validate(headers).await?;
        return Ok(ip);
    }

    let decision = state.limiter.check(&ip).await;
    if !decision.allowed {
        if decision.global_cap_hit {
            GLOBAL_CAP_TOTAL.inc();
        } else {
            RATE_LIMITED_TOTAL.inc();
        }
        return Err(AppError::RateLimited {
            global_cap: decision.global_cap_hit,
        });
    }
    Ok(ip)
}

/// Generate, audit, respond. The audit write is fired and forgotten.
pub(crate) async fn run_generation(
    state: &AppState,
    ip: &str,
    endpoint: &'static str,
    input: Value,
    prompt: String,
) -> Result<Json<Value>, AppError> {
    let start = Instant::now();
    let result = state.ai.generate_json(&prompt).await?;
    let elapsed = start.elapsed();

    state
        .audit
        .log(ip, endpoint, input, result.clone(), elapsed.as_millis() as u64);
    REQUEST_LATENCY.observe(elapsed.as_secs_f64());

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_the_first_element() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "5.6.7.8".parse().unwrap());
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn real_ip_is_the_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "5.6.7.8".parse().unwrap());
        assert_eq!(client_ip(&headers), "5.6.7.8");
    }

    #[test]
    fn loopback_is_the_last_resort() {
        assert_eq!(client_ip(&HeaderMap::new()), "127.0.0.1");
    }
}
