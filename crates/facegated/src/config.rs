use facegate_core::compare::DEFAULT_DISTANCE_THRESHOLD;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Address to bind (default: 0.0.0.0).
    pub bind_addr: String,
    /// Listen port; `PORT` is honored for platform runners (default: 8080).
    pub port: u16,
    /// Base URL of the hosted document store.
    pub store_url: String,
    /// Collection holding the person records (default: PEOPLE).
    pub store_collection: String,
    /// Bearer token for the document store, if it requires one.
    pub store_token: Option<String>,
    /// URL of the face-embedding service endpoint.
    pub embed_url: String,
    /// Euclidean distance at or below which a reference accepts the probe.
    pub distance_threshold: f32,
    /// Base time budget for one match attempt, in seconds.
    pub match_base_timeout_secs: u64,
    /// Additional budget per reference record, in milliseconds.
    pub match_per_record_millis: u64,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("FACEGATE_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_u16("PORT", 8080),
            store_url: std::env::var("FACEGATE_STORE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8090/v1".to_string()),
            store_collection: std::env::var("FACEGATE_STORE_COLLECTION")
                .unwrap_or_else(|_| "PEOPLE".to_string()),
            store_token: std::env::var("FACEGATE_STORE_TOKEN").ok(),
            embed_url: std::env::var("FACEGATE_EMBED_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8091/embeddings".to_string()),
            distance_threshold: env_f32(
                "FACEGATE_DISTANCE_THRESHOLD",
                DEFAULT_DISTANCE_THRESHOLD,
            ),
            match_base_timeout_secs: env_u64("FACEGATE_MATCH_BASE_TIMEOUT_SECS", 10),
            match_per_record_millis: env_u64("FACEGATE_MATCH_PER_RECORD_MILLIS", 500),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
