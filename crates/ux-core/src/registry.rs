//! In-memory registry of monitored sites.
//!
//! The registry is the single piece of state shared between the API handlers
//! and the scheduler tick. All access goes through a [`SiteRegistry`] handle;
//! there is no ambient global.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Health classification of a monitored site, derived from its latest score.
///
/// `Error` is distinct from `Critical`: it marks a check that failed to run,
/// not a low score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteStatus {
    Pending,
    Healthy,
    Warning,
    Critical,
    Error,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Healthy => write!(f, "healthy"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A registered URL tracked by the scheduler with its latest score and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredSite {
    pub url: String,
    pub score: u8,
    pub status: SiteStatus,
    /// `None` until the first successful check; serialized as `"Never"`.
    #[serde(with = "last_check_format")]
    pub last_check: Option<DateTime<Utc>>,
}

impl MonitoredSite {
    fn new(url: String) -> Self {
        Self {
            url,
            score: 0,
            status: SiteStatus::Pending,
            last_check: None,
        }
    }
}

/// Wire format for `last_check`: the sentinel `"Never"` or `"%Y-%m-%d %H:%M:%S"`.
mod last_check_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    const NEVER: &str = "Never";

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_str(NEVER),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == NEVER {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(&s, FORMAT)
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Already monitored")]
    AlreadyMonitored { url: String },
}

/// Lock-guarded store of [`MonitoredSite`] records, keyed by URL.
///
/// Handles are cheap to clone and share one underlying store. Reads return
/// point-in-time snapshots; writes are atomic per record.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Arc<RwLock<Vec<MonitoredSite>>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all registered sites. Not a live view.
    pub async fn list(&self) -> Vec<MonitoredSite> {
        self.sites.read().await.clone()
    }

    /// Register a URL. New sites start Pending with score 0 and no check time.
    pub async fn add(&self, url: impl Into<String>) -> Result<(), RegistryError> {
        let url = url.into();
        let mut sites = self.sites.write().await;
        if sites.iter().any(|s| s.url == url) {
            return Err(RegistryError::AlreadyMonitored { url });
        }
        sites.push(MonitoredSite::new(url));
        Ok(())
    }

    /// Deregister a URL. No-op if the URL is not registered.
    pub async fn remove(&self, url: &str) {
        self.sites.write().await.retain(|s| s.url != url);
    }

    /// Scheduler write-back after a successful check. Silently no-ops if the
    /// site was removed since the tick snapshot was taken.
    pub async fn update(
        &self,
        url: &str,
        score: u8,
        status: SiteStatus,
        checked_at: DateTime<Utc>,
    ) {
        let mut sites = self.sites.write().await;
        if let Some(site) = sites.iter_mut().find(|s| s.url == url) {
            site.score = score;
            site.status = status;
            site.last_check = Some(checked_at);
        }
    }

    /// Scheduler write-back after a failed check: status becomes Error, the
    /// last known score and check time are left untouched.
    pub async fn mark_failed(&self, url: &str) {
        let mut sites = self.sites.write().await;
        if let Some(site) = sites.iter_mut().find(|s| s.url == url) {
            site.status = SiteStatus::Error;
        }
    }

    pub async fn len(&self) -> usize {
        self.sites.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sites.read().await.is_empty()
    }
}
