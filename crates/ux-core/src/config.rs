use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the monitoring loop and the scan engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interval between scheduler ticks (default: 30s).
    pub check_interval: Duration,
    /// Artificial processing delay per scan, modelling real audit latency.
    pub scan_delay: Duration,
    /// HTTP request timeout for narrative-generation calls.
    pub request_timeout: Duration,
    /// Maximum number of retries for failed narrative requests.
    pub max_retries: u32,
    /// Base backoff duration for retries (doubled each attempt).
    pub retry_backoff: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            scan_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

impl MonitorConfig {
    pub fn with_check_interval(mut self, ms: u64) -> Self {
        self.check_interval = Duration::from_millis(ms);
        self
    }

    pub fn with_scan_delay(mut self, ms: u64) -> Self {
        self.scan_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, ms: u64) -> Self {
        self.retry_backoff = Duration::from_millis(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_intervals() {
        let config = MonitorConfig::default();
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.scan_delay, Duration::from_secs(2));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn builders_override_defaults() {
        let config = MonitorConfig::default()
            .with_check_interval(5000)
            .with_scan_delay(0)
            .with_max_retries(0);
        assert_eq!(config.check_interval, Duration::from_millis(5000));
        assert_eq!(config.scan_delay, Duration::ZERO);
        assert_eq!(config.max_retries, 0);
    }
}
