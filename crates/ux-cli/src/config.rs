//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [defaults]
//! check_interval_ms = 30000
//! scan_delay_ms = 2000
//!
//! [narrative]
//! api_key = "your-api-key"
//! model = "gemini-1.5-flash"
//!
//! [[webhook]]
//! url = "https://hooks.example.com/ux-alerts"
//! events = ["score_alert"]
//!
//! sites = [
//!   "https://example.com",
//!   "https://example.org",
//! ]
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use ux_core::{MonitorConfig, WebhookConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub narrative: NarrativeConfig,

    #[serde(default)]
    pub webhook: Vec<WebhookConfig>,

    /// URLs registered with the monitor on startup.
    #[serde(default)]
    pub sites: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

fn default_listen() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub check_interval_ms: Option<u64>,

    #[serde(default)]
    pub scan_delay_ms: Option<u64>,

    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    #[serde(default)]
    pub max_retries: Option<u32>,

    #[serde(default)]
    pub retry_backoff_ms: Option<u64>,
}

impl DefaultsConfig {
    pub fn to_monitor_config(&self) -> MonitorConfig {
        let mut c = MonitorConfig::default();
        if let Some(v) = self.check_interval_ms {
            c = c.with_check_interval(v);
        }
        if let Some(v) = self.scan_delay_ms {
            c = c.with_scan_delay(v);
        }
        if let Some(v) = self.request_timeout_ms {
            c = c.with_request_timeout(v);
        }
        if let Some(v) = self.max_retries {
            c = c.with_max_retries(v);
        }
        if let Some(v) = self.retry_backoff_ms {
            c = c.with_retry_backoff(v);
        }
        c
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NarrativeConfig {
    /// API key for the text-generation service. When absent, every scan uses
    /// the fixed fallback narrative.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        for (i, wh) in self.webhook.iter().enumerate() {
            url::Url::parse(&wh.url)
                .map_err(|e| format!("Invalid webhook URL at index {}: {} ({})", i, wh.url, e))?;
        }

        let mut seen = std::collections::HashSet::new();
        for site in &self.sites {
            let parsed = url::Url::parse(site)
                .map_err(|e| format!("Invalid site URL: {} ({})", site, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!("Site URL must use http or https: {}", site));
            }
            if !seen.insert(site.as_str()) {
                return Err(format!("Duplicate site URL: {}", site));
            }
        }

        if let Some(ref key) = self.narrative.api_key {
            if key.trim().is_empty() {
                return Err("Narrative api_key must not be blank".into());
            }
        }

        match self.server.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }
}
