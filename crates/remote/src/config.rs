use std::time::Duration;

use crate::error::RemoteError;

pub const DEFAULT_BUCKET: &str = "dino-images";
pub const DEFAULT_COLLECTIONS_TABLE: &str = "collections";
pub const DEFAULT_DOMAINS_TABLE: &str = "user_domains";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Hosted backend configuration.
///
/// The endpoint and public (anon) key are never compiled in; they come from
/// the environment (optionally via a `.env` file loaded by the binary).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Storage bucket holding uploaded images.
    pub bucket: String,
    /// Table holding one collection document per user.
    pub collections_table: String,
    /// Table mapping share aliases to user ids.
    pub domains_table: String,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl BackendConfig {
    /// Configuration with default bucket, table names and timeout.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            bucket: DEFAULT_BUCKET.to_string(),
            collections_table: DEFAULT_COLLECTIONS_TABLE.to_string(),
            domains_table: DEFAULT_DOMAINS_TABLE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                         | Default        |
    /// |---------------------------------|----------------|
    /// | `DINODEX_BACKEND_URL`           | (required)     |
    /// | `DINODEX_ANON_KEY`              | (required)     |
    /// | `DINODEX_BUCKET`                | `dino-images`  |
    /// | `DINODEX_COLLECTIONS_TABLE`     | `collections`  |
    /// | `DINODEX_DOMAINS_TABLE`         | `user_domains` |
    /// | `DINODEX_REQUEST_TIMEOUT_SECS`  | `30`           |
    pub fn from_env() -> Result<Self, RemoteError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RemoteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RemoteError::Config(format!("{key} must be set")))
        };

        let mut config = Self::new(required("DINODEX_BACKEND_URL")?, required("DINODEX_ANON_KEY")?);

        if let Some(bucket) = lookup("DINODEX_BUCKET") {
            config.bucket = bucket;
        }
        if let Some(table) = lookup("DINODEX_COLLECTIONS_TABLE") {
            config.collections_table = table;
        }
        if let Some(table) = lookup("DINODEX_DOMAINS_TABLE") {
            config.domains_table = table;
        }
        if let Some(raw) = lookup("DINODEX_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                RemoteError::Config("DINODEX_REQUEST_TIMEOUT_SECS must be a valid u64".into())
            })?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
