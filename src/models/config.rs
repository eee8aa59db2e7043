// src/models/config.rs

//! Harvester configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Root harvester configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarvesterConfig {
    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry delay schedules per failure class
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pacing and rate-limit observation settings
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Date-window filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Per-run limits
    #[serde(default)]
    pub run: RunConfig,
}

impl HarvesterConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agents.is_empty() {
            return Err(HarvestError::configuration("http.user_agents is empty"));
        }
        if self.http.request_timeout_secs == 0 {
            return Err(HarvestError::configuration(
                "http.request_timeout_secs must be > 0",
            ));
        }
        if self.retry.rate_limited_delays_ms.is_empty()
            || self.retry.server_error_delays_ms.is_empty()
            || self.retry.timeout_delays_ms.is_empty()
        {
            return Err(HarvestError::configuration(
                "retry delay schedules must not be empty",
            ));
        }
        if self.pacing.fast_delay_ms.0 > self.pacing.fast_delay_ms.1
            || self.pacing.human_delay_ms.0 > self.pacing.human_delay_ms.1
        {
            return Err(HarvestError::configuration(
                "pacing delay ranges must be (min, max) with min <= max",
            ));
        }
        if !(0.0..=1.0).contains(&self.pacing.rate_limit_threshold) {
            return Err(HarvestError::configuration(
                "pacing.rate_limit_threshold must be within [0, 1]",
            ));
        }
        if self.filter.early_stop_window == 0 {
            return Err(HarvestError::configuration(
                "filter.early_stop_window must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.filter.early_stop_fraction) {
            return Err(HarvestError::configuration(
                "filter.early_stop_fraction must be within [0, 1]",
            ));
        }
        if self.run.run_timeout_secs == 0 {
            return Err(HarvestError::configuration("run.run_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// RPC endpoint base, without the place-specific path
    #[serde(default = "defaults::endpoint_base")]
    pub endpoint_base: String,

    /// User-Agent pool for request fingerprinting
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint_base: defaults::endpoint_base(),
            user_agents: defaults::user_agents(),
            request_timeout_secs: defaults::request_timeout(),
        }
    }
}

/// Retry delay schedules, one per retryable failure class.
///
/// Each schedule lists the waits before attempts 2, 3, ... ; the schedule
/// length is the retry budget for that class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delays after a rate-limited response
    #[serde(default = "defaults::rate_limited_delays")]
    pub rate_limited_delays_ms: Vec<u64>,

    /// Delays after a provider-side 5xx failure
    #[serde(default = "defaults::server_error_delays")]
    pub server_error_delays_ms: Vec<u64>,

    /// Delays after a network timeout
    #[serde(default = "defaults::timeout_delays")]
    pub timeout_delays_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limited_delays_ms: defaults::rate_limited_delays(),
            server_error_delays_ms: defaults::server_error_delays(),
            timeout_delays_ms: defaults::timeout_delays(),
        }
    }
}

/// Pacing and rate-limit observation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Fast-mode delay range (min, max) in milliseconds
    #[serde(default = "defaults::fast_delay")]
    pub fast_delay_ms: (u64, u64),

    /// Human-mode delay range (min, max) in milliseconds
    #[serde(default = "defaults::human_delay")]
    pub human_delay_ms: (u64, u64),

    /// Width of the rolling outcome window in seconds
    #[serde(default = "defaults::rate_limit_window")]
    pub rate_limit_window_secs: u64,

    /// Rate-limited fraction of the window that triggers escalation
    #[serde(default = "defaults::rate_limit_threshold")]
    pub rate_limit_threshold: f64,

    /// Upper bound on the delay escalation multiplier
    #[serde(default = "defaults::escalation_cap")]
    pub escalation_cap: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            fast_delay_ms: defaults::fast_delay(),
            human_delay_ms: defaults::human_delay(),
            rate_limit_window_secs: defaults::rate_limit_window(),
            rate_limit_threshold: defaults::rate_limit_threshold(),
            escalation_cap: defaults::escalation_cap(),
        }
    }
}

/// Date-window filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Trailing record count observed by the early-stop heuristic
    #[serde(default = "defaults::early_stop_window")]
    pub early_stop_window: usize,

    /// Out-of-window fraction that triggers early stop
    #[serde(default = "defaults::early_stop_fraction")]
    pub early_stop_fraction: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            early_stop_window: defaults::early_stop_window(),
            early_stop_fraction: defaults::early_stop_fraction(),
        }
    }
}

/// Per-run limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Wall-clock cap for one run, in seconds
    #[serde(default = "defaults::run_timeout")]
    pub run_timeout_secs: u64,

    /// Records requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,
}

impl RunConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_timeout_secs: defaults::run_timeout(),
            page_size: defaults::page_size(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn endpoint_base() -> String {
        "https://www.google.com/maps/rpc/listugcposts".into()
    }
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36"
                .into(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .into(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) \
             Gecko/20100101 Firefox/125.0"
                .into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.4 Safari/605.1.15"
                .into(),
        ]
    }
    pub fn request_timeout() -> u64 {
        30
    }

    // Retry schedules: delays double per attempt, budget of three per class
    pub fn rate_limited_delays() -> Vec<u64> {
        vec![5_000, 10_000, 20_000]
    }
    pub fn server_error_delays() -> Vec<u64> {
        vec![2_000, 4_000, 8_000]
    }
    pub fn timeout_delays() -> Vec<u64> {
        vec![1_000, 2_000, 4_000]
    }

    // Pacing defaults
    pub fn fast_delay() -> (u64, u64) {
        (50, 150)
    }
    pub fn human_delay() -> (u64, u64) {
        (500, 1_500)
    }
    pub fn rate_limit_window() -> u64 {
        60
    }
    pub fn rate_limit_threshold() -> f64 {
        0.3
    }
    pub fn escalation_cap() -> u32 {
        8
    }

    // Filter defaults
    pub fn early_stop_window() -> usize {
        20
    }
    pub fn early_stop_fraction() -> f64 {
        0.5
    }

    // Run defaults
    pub fn run_timeout() -> u64 {
        1_800
    }
    pub fn page_size() -> usize {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        assert!(HarvesterConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agents() {
        let mut config = HarvesterConfig::default();
        config.http.user_agents.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_pacing_range() {
        let mut config = HarvesterConfig::default();
        config.pacing.fast_delay_ms = (200, 100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_early_stop_window() {
        let mut config = HarvesterConfig::default();
        config.filter.early_stop_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut config = HarvesterConfig::default();
        config.pacing.rate_limit_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pacing]\nrate_limit_threshold = 0.5\n\n[filter]\nearly_stop_window = 10"
        )
        .unwrap();

        let config = HarvesterConfig::load(file.path()).unwrap();
        assert_eq!(config.pacing.rate_limit_threshold, 0.5);
        assert_eq!(config.filter.early_stop_window, 10);
        assert_eq!(config.retry.rate_limited_delays_ms, vec![5_000, 10_000, 20_000]);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = HarvesterConfig::load_or_default("/does/not/exist.toml");
        assert!(config.validate().is_ok());
    }
}
