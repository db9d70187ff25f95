use std::sync::Arc;
use tracing::{info, warn};

use crate::ai::AiClient;
use crate::api_auth::ApiKeyAuth;
use crate::audit::AuditLogger;
use crate::clock::{Clock, SystemClock};
use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::share::ShareStore;
use crate::store::{KvStore, MemoryStore, RedisStore};

// app's shared state
pub struct AppState {
    pub config: Args,
    pub limiter: RateLimiter,
    pub auth: ApiKeyAuth,
    pub audit: AuditLogger,
    pub share: ShareStore,
    pub ai: AiClient,
    pub http: reqwest::Client,
}

impl AppState {
    pub async fn new(config: Args) -> Arc<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // Backend selected once here; nothing re-checks the environment per
        // call. No remote backend means non-durable per-process counters and
        // no audit trail.
        let remote: Option<Arc<dyn KvStore>> = match &config.redis_url {
            Some(url) => match RedisStore::connect(url).await {
                Ok(store) => {
                    info!("using remote key-value backend");
                    Some(Arc::new(store))
                }
                Err(err) => {
                    warn!("remote backend unreachable ({err}), using in-memory counters");
                    None
                }
            },
            None => {
                info!("REDIS_URL not set, using in-memory counters");
                None
            }
        };

        let store: Arc<dyn KvStore> = match &remote {
            Some(store) => store.clone(),
            None => Arc::new(MemoryStore::new(clock.clone())),
        };

        let keys = config.api_key_list();
        if keys.is_empty() {
            info!("API_KEYS empty, metered tier will reject every key");
        }

        // one client for both the provider and roast fetches
        let http = reqwest::Client::new();

        Arc::new(Self {
            limiter: RateLimiter::new(
                store.clone(),
                clock.clone(),
                config.free_limit,
                config.global_limit,
            ),
            auth: ApiKeyAuth::new(keys, store.clone(), clock.clone(), config.monthly_limit),
            audit: AuditLogger::new(remote, clock.clone()),
            share: ShareStore::new(store, clock),
            ai: AiClient::new(http.clone(), config.gemini_api_key.clone()),
            http,
            config,
        })
    }
}
