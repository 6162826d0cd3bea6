#![forbid(unsafe_code)]

pub mod alert;
pub mod auth;
pub mod config;
pub mod notify;
pub mod registry;
pub mod scan;
pub mod scheduler;

pub use alert::{evaluate, AlertDecision};
pub use auth::{ApiKeyValidator, PrefixKeyValidator, API_KEY_PREFIX};
pub use config::MonitorConfig;
pub use notify::{
    build_client, notification_channel, Notification, WebhookConfig, WebhookDispatcher,
    WebhookPayload,
};
pub use registry::{MonitoredSite, RegistryError, SiteRegistry, SiteStatus};
pub use scan::{
    CategoryScores, DisabledNarrator, GeminiNarrator, NarrativeError, NarrativeGenerator, Sampler,
    ScanEngine, ScanError, ScanResult, Scanner, ScriptedSampler, Severity, StrengthFinding,
    ThreadRngSampler, WeaknessFinding, FALLBACK_SUMMARY, STRENGTH_CATALOG, WEAKNESS_CATALOG,
};
pub use scheduler::{MonitorScheduler, SchedulerState};
