//! Narrative generation clients.
//!
//! The scan engine asks a [`NarrativeGenerator`] for the human-readable
//! summary and fix text. The real implementation talks to the Generative
//! Language API; when no credential is configured the [`DisabledNarrator`]
//! stands in and every call reports [`NarrativeError::NotConfigured`], which
//! the engine converts to fixed fallback text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::notify::build_client;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative generation is not configured")]
    NotConfigured,
    #[error("narrative service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("narrative request failed: {reason}")]
    Network { reason: String },
    #[error("malformed narrative response: {0}")]
    Malformed(String),
}

/// External text-generation collaborator.
///
/// Callers must treat every error as recoverable; the scan engine never
/// propagates a narrative failure.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, NarrativeError>;
}

/// Client for the Generative Language API with retries and backoff.
#[derive(Debug, Clone)]
pub struct GeminiNarrator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl GeminiNarrator {
    pub fn new(api_key: impl Into<String>, config: &MonitorConfig) -> Result<Self, NarrativeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NarrativeError::NotConfigured);
        }
        Ok(Self {
            client: build_client(config.request_timeout),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl NarrativeGenerator for GeminiNarrator {
    async fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let payload = GenerateRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                debug!(attempt, backoff_ms = backoff.as_millis() as u64, "Retrying narrative request");
                tokio::time::sleep(backoff).await;
            }

            let response = self
                .client
                .post(self.request_url())
                .query(&[("key", self.api_key.as_str())])
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        let body: GenerateResponse = response
                            .json()
                            .await
                            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;
                        return body
                            .candidates
                            .into_iter()
                            .flat_map(|candidate| candidate.content.parts)
                            .filter_map(|part| part.text)
                            .next()
                            .ok_or_else(|| {
                                NarrativeError::Malformed("response contained no text".into())
                            });
                    }

                    let status = response.status().as_u16();
                    let message = response
                        .status()
                        .canonical_reason()
                        .unwrap_or("Unknown")
                        .to_string();
                    warn!(status, attempt, "Narrative service returned error status");
                    let err = NarrativeError::Http { status, message };

                    if (400..500).contains(&status) && status != 429 {
                        return Err(err);
                    }
                    last_error = Some(err);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Narrative request failed");
                    last_error = Some(NarrativeError::Network {
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(last_error.expect("Loop must have produced an error"))
    }
}

/// Stand-in selected when no credential is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNarrator;

#[async_trait]
impl NarrativeGenerator for DisabledNarrator {
    async fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
        Err(NarrativeError::NotConfigured)
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
