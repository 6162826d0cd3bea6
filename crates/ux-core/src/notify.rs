//! Webhook alert delivery.
//!
//! The scheduler emits advisory [`Notification`]s on score regressions and
//! failed checks. A [`WebhookDispatcher`] task drains the notification
//! channel and POSTs a JSON envelope to every configured endpoint that
//! subscribes to the notification type. Delivery is best-effort: failures
//! are logged and never reach the scheduler.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::registry::SiteStatus;

const SIGNATURE_HEADER: &str = "X-UX-Signature-256";

/// A single webhook endpoint and its delivery policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,

    /// Notification types to deliver; an empty list subscribes to all.
    #[serde(default)]
    pub events: Vec<String>,

    #[serde(default = "default_webhook_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_webhook_retries")]
    pub max_retries: u32,

    /// HMAC-SHA256 signing secret; when set, payloads carry the
    /// `X-UX-Signature-256` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn default_webhook_timeout_ms() -> u64 {
    5000
}

fn default_webhook_retries() -> u32 {
    2
}

impl WebhookConfig {
    pub fn accepts(&self, notification_type: &str) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == notification_type)
    }
}

/// An advisory signal produced by the scheduler.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A site's score regressed sharply between consecutive checks.
    ScoreAlert {
        url: String,
        previous_score: u8,
        new_score: u8,
        status: SiteStatus,
    },
    /// A scheduled re-scan failed to run.
    CheckFailed { url: String, reason: String },
}

impl Notification {
    pub fn notification_type(&self) -> &str {
        match self {
            Notification::ScoreAlert { .. } => "score_alert",
            Notification::CheckFailed { .. } => "check_failed",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Notification::ScoreAlert { url, .. } | Notification::CheckFailed { url, .. } => url,
        }
    }
}

/// The JSON envelope POSTed to webhook endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub version: u8,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub url: String,
    pub data: serde_json::Value,
}

impl WebhookPayload {
    pub fn from_notification(notification: &Notification) -> Self {
        let data = match notification {
            Notification::ScoreAlert {
                previous_score,
                new_score,
                status,
                ..
            } => serde_json::json!({
                "previous_score": previous_score,
                "new_score": new_score,
                "status": status,
            }),
            Notification::CheckFailed { reason, .. } => serde_json::json!({
                "reason": reason,
            }),
        };

        Self {
            version: 1,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            notification_type: notification.notification_type().to_string(),
            url: notification.url().to_string(),
            data,
        }
    }
}

/// Drains the notification channel and fans each item out to the
/// subscribed endpoints. Runs until every sender is dropped.
pub struct WebhookDispatcher {
    rx: mpsc::UnboundedReceiver<Notification>,
    endpoints: Vec<WebhookConfig>,
    client: Client,
}

impl WebhookDispatcher {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Notification>,
        endpoints: Vec<WebhookConfig>,
        client: Client,
    ) -> Self {
        Self {
            rx,
            endpoints,
            client,
        }
    }

    pub async fn run(mut self) {
        debug!(
            endpoint_count = self.endpoints.len(),
            "Webhook dispatcher started"
        );

        while let Some(notification) = self.rx.recv().await {
            self.fan_out(&notification).await;
        }

        debug!("Webhook dispatcher shutting down");
    }

    async fn fan_out(&self, notification: &Notification) {
        let notification_type = notification.notification_type();

        let payload = WebhookPayload::from_notification(notification);
        let body = match serde_json::to_vec(&payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to serialize webhook payload");
                return;
            }
        };

        for endpoint in self
            .endpoints
            .iter()
            .filter(|e| e.accepts(notification_type))
        {
            match post_with_retries(&self.client, endpoint, &body).await {
                Ok(()) => {
                    debug!(url = %endpoint.url, notification_type, "Webhook delivered");
                }
                Err(e) => {
                    warn!(
                        url = %endpoint.url,
                        notification_type,
                        error = %e,
                        "Webhook delivery failed"
                    );
                }
            }
        }
    }
}

pub fn notification_channel() -> (
    mpsc::UnboundedSender<Notification>,
    mpsc::UnboundedReceiver<Notification>,
) {
    mpsc::unbounded_channel()
}

/// Shared HTTP client builder for outbound calls.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent("ux-monitor/0.1")
        .build()
        .expect("Failed to build HTTP client")
}

async fn post_with_retries(
    client: &Client,
    endpoint: &WebhookConfig,
    body: &[u8],
) -> Result<(), String> {
    let signature = endpoint
        .secret
        .as_deref()
        .map(|secret| signature_header(body, secret));
    let timeout = Duration::from_millis(endpoint.timeout_ms);

    let mut last_error = String::new();

    for attempt in 0..=endpoint.max_retries {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(500) * 2u32.pow(attempt - 1)).await;
        }

        let mut request = client
            .post(&endpoint.url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .body(body.to_vec());
        if let Some(ref signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => {
                let status = resp.status().as_u16();
                last_error = format!("HTTP {} from {}", status, endpoint.url);
                // Client errors other than rate limiting will not improve.
                if (400..500).contains(&status) && status != 429 {
                    break;
                }
            }
            Err(e) => {
                last_error = format!("Request to {} failed: {}", endpoint.url, e);
            }
        }
    }

    Err(last_error)
}

fn signature_header(body: &[u8], secret: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
