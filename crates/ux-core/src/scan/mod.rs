mod catalog;
mod engine;
mod narrative;
mod result;
mod sampler;

pub use catalog::{STRENGTH_CATALOG, WEAKNESS_CATALOG};
pub use engine::{ScanEngine, FALLBACK_SUMMARY};
pub use narrative::{DisabledNarrator, GeminiNarrator, NarrativeError, NarrativeGenerator};
pub use result::{CategoryScores, ScanResult, Severity, StrengthFinding, WeaknessFinding};
pub use sampler::{Sampler, ScriptedSampler, ThreadRngSampler};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("URL required")]
    EmptyUrl,
    #[error("scan failed: {0}")]
    Failed(String),
}

/// Trait for auditing a URL into a [`ScanResult`].
///
/// The scheduler and the API surface depend on this trait rather than on
/// [`ScanEngine`] directly, so tests can substitute implementations. The
/// trait is object-safe and Send + Sync for use across async tasks.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, url: &str) -> Result<ScanResult, ScanError>;

    /// Advisory code suggestion for the most common finding. Always yields a
    /// fix string; failures are absorbed into a fallback.
    async fn suggest_fix(&self) -> String;
}
