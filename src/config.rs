//! Application configuration
//!
//! Everything comes from environment variables with sensible defaults, so the
//! binary runs against a local backend out of the box.

use crate::error::{AppError, Result};
use std::time::Duration;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Poll intervals for the periodically refreshed views.
#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    /// Portfolio snapshot and watchlist detail.
    pub dashboard: Duration,
    /// Live ticker tape.
    pub live_quotes: Duration,
    /// Market summary cards and growth-chart inputs.
    pub market: Duration,
    /// TITAN status while a scan is running.
    pub scan_status: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            dashboard: Duration::from_secs(10),
            live_quotes: Duration::from_secs(15),
            market: Duration::from_secs(30),
            scan_status: Duration::from_secs(1),
        }
    }
}

/// Application configuration shared across the gateway and pollers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub http_timeout: Duration,
    pub intervals: PollIntervals,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let raw_url =
            std::env::var("TITANFOLIO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&raw_url)
            .map_err(|e| AppError::Config(format!("Invalid TITANFOLIO_API_URL '{}': {}", raw_url, e)))?;

        let http_timeout = Duration::from_secs(
            env_u64("TITANFOLIO_HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        let mut intervals = PollIntervals::default();
        if let Some(secs) = env_u64("TITANFOLIO_DASHBOARD_POLL_SECS")? {
            intervals.dashboard = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("TITANFOLIO_QUOTES_POLL_SECS")? {
            intervals.live_quotes = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("TITANFOLIO_MARKET_POLL_SECS")? {
            intervals.market = Duration::from_secs(secs);
        }

        Ok(Self {
            base_url,
            http_timeout,
            intervals,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default URL is valid"),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            intervals: PollIntervals::default(),
        }
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} must be an integer, got '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}
