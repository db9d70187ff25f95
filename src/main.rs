use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod ai;
mod api_auth;
mod audit;
mod clock;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod prompts;
mod rate_limit;
mod share;
mod state;
mod store;
mod util;

use config::Args;
use handlers::{
    clapback_handler, dare_handler, excuse_handler, fortune_handler, health_handler,
    judge_handler, meme_handler, metrics_handler, rate_handler, roast_handler,
    share_get_handler, share_save_handler,
};
use state::AppState;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // parse cli arguments (env vars double as defaults)
    let args = Args::parse();
    let port = args.port;

    info!("Initializing state...");
    let state = AppState::new(args).await;

    let app = app(state.clone());

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!("Helliduck running on http://localhost:{port}");
    info!(
        "Anonymous tier: {}/day per IP, {}/day global; API tier: {}/month",
        state.config.free_limit, state.config.global_limit, state.config.monthly_limit
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

fn app(state: std::sync::Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/share", post(share_save_handler).get(share_get_handler))
        .route("/api/v1/excuse", post(excuse_handler))
        .route("/api/v1/fortune", post(fortune_handler))
        .route("/api/v1/judge", post(judge_handler))
        .route("/api/v1/rate", post(rate_handler))
        .route("/api/v1/dare", post(dare_handler))
        .route("/api/v1/roast", post(roast_handler))
        .route("/api/v1/meme", post(meme_handler))
        .route("/api/v1/clapback", post(clapback_handler))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn offline_args() -> Args {
        let mut args = Args::parse_from(["helliduck"]);
        args.redis_url = None;
        args.gemini_api_key = None;
        args.api_keys = "duck-test-key".to_string();
        args
    }

    async fn offline_app(args: Args) -> Router {
        app(AppState::new(args).await)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = offline_app(offline_args()).await;
        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn share_roundtrips_through_the_http_surface() {
        let app = offline_app(offline_args()).await;

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/share",
                r#"{"type":"fortune","data":{"fortune":"quack"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let saved: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let id = saved["id"].as_str().unwrap();
        assert_eq!(saved["url"], format!("/s/{id}"));

        let res = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/share?id={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(fetched["type"], "fortune");
        assert_eq!(fetched["data"]["fortune"], "quack");
    }

    #[tokio::test]
    async fn share_rejects_missing_fields_and_unknown_ids() {
        let app = offline_app(offline_args()).await;

        let res = app
            .clone()
            .oneshot(post_json("/api/share", r#"{"type":"fortune"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/share?id=nope1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn exhausted_quota_rejects_before_any_generation() {
        let mut args = offline_args();
        args.free_limit = 0;
        let app = offline_app(args).await;

        let res = app
            .oneshot(post_json("/api/v1/excuse", r#"{"situation":"late again"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn admitted_request_without_provider_key_maps_to_bad_gateway() {
        let app = offline_app(offline_args()).await;

        let res = app
            .oneshot(post_json("/api/v1/excuse", r#"{"situation":"late again"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn missing_input_is_a_400_with_our_message() {
        let app = offline_app(offline_args()).await;

        let res = app
            .oneshot(post_json("/api/v1/excuse", "{}"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "Please provide a situation");
    }

    // Minimal generateContent stand-in so a full request path can succeed
    // without the real provider.
    async fn stub_provider() -> String {
        let canned = serde_json::json!({
            "candidates": [{ "content": { "parts": [{
                "text": "{\"excuse\":\"quack\",\"believability_actual\":50,\"duck_comment\":\"sure\"}"
            }] } }]
        });
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(move || {
                let canned = canned.clone();
                async move { axum::Json(canned) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta/models")
    }

    #[tokio::test]
    async fn audit_outage_does_not_alter_a_successful_response() {
        use crate::ai::AiClient;
        use crate::api_auth::ApiKeyAuth;
        use crate::audit::AuditLogger;
        use crate::clock::{Clock, SystemClock};
        use crate::rate_limit::RateLimiter;
        use crate::share::ShareStore;
        use crate::store::{KvStore, MemoryStore, test_support::BrokenStore};
        use std::sync::Arc;

        let base_url = stub_provider().await;
        let args = offline_args();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new(clock.clone()));
        let http = reqwest::Client::new();

        let state = Arc::new(AppState {
            limiter: RateLimiter::new(
                store.clone(),
                clock.clone(),
                args.free_limit,
                args.global_limit,
            ),
            auth: ApiKeyAuth::new(args.api_key_list(), store.clone(), clock.clone(), args.monthly_limit),
            // every audit write will fail; the endpoint must not notice
            audit: AuditLogger::new(Some(Arc::new(BrokenStore)), clock.clone()),
            share: ShareStore::new(store, clock),
            ai: AiClient::with_base_url(http.clone(), Some("test-key".to_string()), base_url),
            http,
            config: args,
        });

        let res = app(state)
            .oneshot(post_json("/api/v1/excuse", r#"{"situation":"late again"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["excuse"], "quack");

        // let the detached audit task run and fail quietly
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn unknown_api_key_is_unauthorized() {
        let app = offline_app(offline_args()).await;

        let mut req = post_json("/api/v1/fortune", "{}");
        req.headers_mut()
            .insert("x-api-key", "wrong-key".parse().unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "Invalid API key");
    }
}
