// src/config/server.rs
use anyhow::Context;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

// --- env defaults & names ---
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

pub const MIN_BODY_LIMIT_BYTES: usize = 1024;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "HOST";
pub const ENV_BODY_LIMIT_BYTES: &str = "BODY_LIMIT_BYTES";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    pub metrics_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            log_format: LogFormat::default(),
            metrics_enabled: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Unset or blank keys keep their defaults;
    /// values that are present but malformed are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(raw) = get(ENV_PORT) {
            cfg.port = raw
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{raw}'"))?;
        }
        if let Some(raw) = get(ENV_HOST) {
            cfg.host = raw
                .parse()
                .with_context(|| format!("{ENV_HOST} must be an IP address, got '{raw}'"))?;
        }
        if let Some(raw) = get(ENV_BODY_LIMIT_BYTES) {
            let n: usize = raw
                .parse()
                .with_context(|| format!("{ENV_BODY_LIMIT_BYTES} must be a byte count, got '{raw}'"))?;
            cfg.body_limit_bytes = n.max(MIN_BODY_LIMIT_BYTES);
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_MS) {
            let ms: u64 = raw.parse().with_context(|| {
                format!("{ENV_REQUEST_TIMEOUT_MS} must be milliseconds, got '{raw}'")
            })?;
            cfg.request_timeout = Duration::from_millis(ms.max(MIN_REQUEST_TIMEOUT_MS));
        }
        if let Some(raw) = get(ENV_LOG_FORMAT) {
            cfg.log_format = match raw.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" | "text" => LogFormat::Compact,
                other => anyhow::bail!("{ENV_LOG_FORMAT} must be 'json' or 'compact', got '{other}'"),
            };
        }
        if let Some(raw) = get(ENV_METRICS_ENABLED) {
            cfg.metrics_enabled = matches!(
                raw.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
