use clap::Parser;

// CLI argument structure, every flag also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "helliduck")]
#[command(about = "Novelty AI endpoints with admission control and usage metering")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080, env = "PORT")]
    pub port: u16,

    // Remote key-value backend. Absent means process-local counters only
    // (non-durable, per-instance) and a disabled audit log.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    // Comma-separated allow-list for the metered API tier
    #[arg(long, env = "API_KEYS", default_value = "")]
    pub api_keys: String,

    // Generative provider key. Absent disables every AI endpoint.
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    // Anonymous requests per IP per UTC day
    #[arg(long, default_value_t = 10, env = "FREE_LIMIT")]
    pub free_limit: u32,

    // Aggregate anonymous AI calls per UTC day across all callers
    #[arg(long, default_value_t = 500, env = "GLOBAL_LIMIT")]
    pub global_limit: u32,

    // Metered API calls per key per calendar month
    #[arg(long, default_value_t = 100, env = "MONTHLY_LIMIT")]
    pub monthly_limit: u32,

    // Timeout for fetching a roast target
    #[arg(long, default_value_t = 10, env = "ROAST_TIMEOUT_SECS")]
    pub roast_timeout_secs: u64,
}

impl Args {
    /// Parsed allow-list, empty entries dropped.
    pub fn api_key_list(&self) -> Vec<String> {
        self.api_keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}
