use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("helliduck_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "helliduck_rate_limited_total",
        "Requests rejected by the per-IP daily quota"
    )
    .unwrap();
    pub static ref GLOBAL_CAP_TOTAL: Counter = register_counter!(
        "helliduck_global_cap_total",
        "Requests rejected by the global daily cap"
    )
    .unwrap();
    pub static ref AI_FALLBACK_TOTAL: Counter = register_counter!(
        "helliduck_ai_fallback_total",
        "Generations retried on the fallback model"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "helliduck_request_latency_seconds",
        "Generation latency in seconds"
    )
    .unwrap();
}
