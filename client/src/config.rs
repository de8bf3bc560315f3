//! Client configuration parsed from environment variables.
//!
//! Required:
//! - `API_URL`: REST base, e.g. `https://host/api`
//! - `WS_URL`: websocket base; `http(s)` schemes are rewritten to `ws(s)`
//!
//! Optional:
//! - `APP_URL`: public origin used when building share links
//! - `RECONNECT_BASE_MS`: first reconnect delay, default 1000
//! - `RECONNECT_MAX_MS`: reconnect delay cap, default 10000
//! - `RECONNECT_JITTER_MS`: upper bound of random delay added per attempt, default 250

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;
pub const DEFAULT_RECONNECT_JITTER_MS: u64 = 250;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    MissingVar { var: &'static str },
    #[error("{var} must be an absolute URL with a supported scheme, got `{value}`")]
    InvalidUrl { var: &'static str, value: String },
}

/// Capped exponential backoff settings for channel reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
    pub jitter_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_RECONNECT_BASE_MS,
            max_ms: DEFAULT_RECONNECT_MAX_MS,
            jitter_ms: DEFAULT_RECONNECT_JITTER_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base URL without trailing slash.
    pub api_url: String,
    /// Websocket base URL (`ws://` or `wss://`) without trailing slash.
    pub ws_url: String,
    /// Public origin for share links, without trailing slash.
    pub app_url: String,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Build typed client config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is absent or a URL has
    /// an unsupported scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = get("API_URL").ok_or(ConfigError::MissingVar { var: "API_URL" })?;
        let api_url = http_base("API_URL", &api_url)?;

        let ws_url = get("WS_URL").ok_or(ConfigError::MissingVar { var: "WS_URL" })?;
        let ws_url = websocket_base(&ws_url)?;

        let app_url = get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_owned());
        let app_url = http_base("APP_URL", &app_url)?;

        let base_ms = parse_or(get("RECONNECT_BASE_MS"), DEFAULT_RECONNECT_BASE_MS).max(1);
        let max_ms = parse_or(get("RECONNECT_MAX_MS"), DEFAULT_RECONNECT_MAX_MS).max(base_ms);
        let jitter_ms = parse_or(get("RECONNECT_JITTER_MS"), DEFAULT_RECONNECT_JITTER_MS);

        Ok(Self {
            api_url,
            ws_url,
            app_url,
            reconnect: ReconnectPolicy { base_ms, max_ms, jitter_ms },
        })
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn http_base(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_owned());
    }
    Err(ConfigError::InvalidUrl { var, value: raw.to_owned() })
}

fn websocket_base(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        return Ok(trimmed.to_owned());
    }
    if let Some(rest) = trimmed.strip_prefix("http://") {
        return Ok(format!("ws://{rest}"));
    }
    if let Some(rest) = trimmed.strip_prefix("https://") {
        return Ok(format!("wss://{rest}"));
    }
    Err(ConfigError::InvalidUrl { var: "WS_URL", value: raw.to_owned() })
}
