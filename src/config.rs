use std::env;
use log::warn;

// Server Configuration
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_WS_BIND_ADDRESS: &str = "127.0.0.1:8765";

// Upstream provider
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// Snapshot cache
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 20;

// Live streaming
pub const DEFAULT_STREAM_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_STREAM_BACKOFF_SECS: u64 = 5;
pub const STREAM_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
pub const CLIENT_CHANNEL_SIZE: usize = 100;

// Sessions
pub const CLEANUP_INTERVAL_SECS: u64 = 60;

pub struct Config {
    pub bind_address: String,
    pub ws_bind_address: String,
    pub provider_base_url: String,
    pub fetch_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub fetch_concurrency: usize,
    pub stream_interval_secs: u64,
    pub stream_backoff_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            ws_bind_address: env::var("WS_BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_WS_BIND_ADDRESS.to_string()),
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.to_string()),
            fetch_timeout_secs: env_u64("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS),
            cache_ttl_secs: env_u64("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            fetch_concurrency: env_u64("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY as u64)
                as usize,
            stream_interval_secs: env_u64("STREAM_INTERVAL_SECS", DEFAULT_STREAM_INTERVAL_SECS),
            stream_backoff_secs: env_u64("STREAM_BACKOFF_SECS", DEFAULT_STREAM_BACKOFF_SECS),
            log_level: env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bind_address.is_empty() || self.ws_bind_address.is_empty() {
            return Err("Bind addresses must not be empty".to_string());
        }

        if self.provider_base_url.is_empty() {
            return Err("Provider base URL must not be empty".to_string());
        }

        if self.fetch_concurrency == 0 {
            return Err("FETCH_CONCURRENCY must be at least 1".to_string());
        }

        if self.stream_interval_secs == 0 {
            return Err("STREAM_INTERVAL_SECS must be at least 1".to_string());
        }

        if self.fetch_timeout_secs == 0 {
            return Err("FETCH_TIMEOUT_SECS must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn log_config(&self) {
        println!("Server Configuration:");
        println!("  Dashboard Address: {}", self.bind_address);
        println!("  WebSocket Address: {}", self.ws_bind_address);
        println!("  Provider Base URL: {}", self.provider_base_url);
        println!("  Cache TTL: {}s", self.cache_ttl_secs);
        println!("  Fetch Concurrency: {}", self.fetch_concurrency);
        println!("  Stream Interval: {}s", self.stream_interval_secs);
        println!("  Log Level: {}", self.log_level);
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}: {:?}, using default {}", key, value, default);
            default
        }),
        Err(_) => default,
    }
}
