use std::env;
use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;
use validator::Validate;

/// Runtime settings, read from the environment (after `.env`).
#[derive(Debug, Clone, Serialize, Validate)]
pub struct AppConfig {
    #[validate(url)]
    pub yatai_endpoint: String,
    #[validate(length(min = 1))]
    pub yatai_organization: String,
    pub bind_addr: String,
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
    #[validate(range(min = 1, max = 2_592_000))]
    pub draft_ttl_secs: i64,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            yatai_endpoint: "http://localhost:7777".into(),
            yatai_organization: "default".into(),
            bind_addr: "0.0.0.0:7788".into(),
            request_timeout_ms: 15_000,
            draft_ttl_secs: 3_600,
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            yatai_endpoint: env::var("YATAI_ENDPOINT").unwrap_or(defaults.yatai_endpoint),
            yatai_organization: env::var("YATAI_ORGANIZATION")
                .unwrap_or(defaults.yatai_organization),
            bind_addr: env::var("CONSOLE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            request_timeout_ms: parse_or("CONSOLE_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            draft_ttl_secs: parse_or("CONSOLE_DRAFT_TTL_SECS", defaults.draft_ttl_secs),
            log_dir: env::var("CONSOLE_LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn draft_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.draft_ttl_secs)
            .unwrap_or_else(|| chrono::Duration::seconds(Self::default().draft_ttl_secs))
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("{} has invalid value {:?}, using {}", key, raw, default);
            default
        }
    }
}
