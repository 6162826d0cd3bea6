//! Timer-driven monitoring loop.
//!
//! The scheduler owns the periodic re-scan of every registered site. It is
//! explicitly startable and stoppable, runs one tick at a time, and isolates
//! per-site failures so one broken target never aborts the rest of a tick.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::alert::evaluate;
use crate::config::MonitorConfig;
use crate::notify::Notification;
use crate::registry::SiteRegistry;
use crate::scan::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Active,
    Stopping,
    Stopped,
}

impl SchedulerState {
    pub fn can_transition_to(self, target: SchedulerState) -> bool {
        matches!(
            (self, target),
            (SchedulerState::Idle, SchedulerState::Active)
                | (SchedulerState::Active, SchedulerState::Stopping)
                | (SchedulerState::Stopping, SchedulerState::Stopped)
                | (SchedulerState::Stopped, SchedulerState::Active)
        )
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

pub struct MonitorScheduler {
    registry: SiteRegistry,
    scanner: Arc<dyn Scanner>,
    config: MonitorConfig,
    state: Arc<RwLock<SchedulerState>>,
    last_tick: Arc<RwLock<Option<DateTime<Utc>>>>,
    notification_tx: Option<UnboundedSender<Notification>>,
}

impl MonitorScheduler {
    pub fn new(
        registry: SiteRegistry,
        scanner: Arc<dyn Scanner>,
        config: &MonitorConfig,
        notification_tx: Option<UnboundedSender<Notification>>,
    ) -> Self {
        Self {
            registry,
            scanner,
            config: config.clone(),
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            last_tick: Arc::new(RwLock::new(None)),
            notification_tx,
        }
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    /// Start time of the most recent tick, if any tick has run yet.
    pub async fn last_tick(&self) -> Option<DateTime<Utc>> {
        *self.last_tick.read().await
    }

    pub fn check_interval(&self) -> std::time::Duration {
        self.config.check_interval
    }

    /// Spawn the monitoring loop. Idempotent: calling start on an already
    /// active scheduler does nothing.
    pub async fn start(&self) {
        {
            let mut state = self.state.write().await;
            if !state.can_transition_to(SchedulerState::Active) {
                return;
            }
            *state = SchedulerState::Active;
        }

        info!(
            check_interval_ms = self.config.check_interval.as_millis() as u64,
            "Starting monitor scheduler"
        );

        let registry = self.registry.clone();
        let scanner = Arc::clone(&self.scanner);
        let state = Arc::clone(&self.state);
        let last_tick = Arc::clone(&self.last_tick);
        let notification_tx = self.notification_tx.clone();
        let interval = self.config.check_interval;

        tokio::spawn(async move {
            loop {
                {
                    let current_state = *state.read().await;
                    if current_state != SchedulerState::Active {
                        let mut s = state.write().await;
                        *s = SchedulerState::Stopped;
                        info!("Monitor scheduler stopped");
                        break;
                    }
                }

                run_tick(&registry, &scanner, &notification_tx, &last_tick).await;

                tokio::time::sleep(interval).await;
            }
        });
    }

    /// Request the loop to stop. The state settles at Stopped once the
    /// current tick, if any, has finished.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if state.can_transition_to(SchedulerState::Stopping) {
            *state = SchedulerState::Stopping;
            info!("Stopping monitor scheduler");
        }
    }

    /// Run a single tick inline, outside the background loop.
    pub async fn tick_once(&self) {
        run_tick(
            &self.registry,
            &self.scanner,
            &self.notification_tx,
            &self.last_tick,
        )
        .await;
    }
}

/// One pass over the registered sites.
///
/// The work list is copied out before any blocking work, so the registry
/// lock is only held for the snapshot and the short per-record write-back.
async fn run_tick(
    registry: &SiteRegistry,
    scanner: &Arc<dyn Scanner>,
    notification_tx: &Option<UnboundedSender<Notification>>,
    last_tick: &Arc<RwLock<Option<DateTime<Utc>>>>,
) {
    *last_tick.write().await = Some(Utc::now());

    let targets: Vec<(String, u8)> = registry
        .list()
        .await
        .into_iter()
        .map(|site| (site.url, site.score))
        .collect();

    if targets.is_empty() {
        return;
    }

    debug!(site_count = targets.len(), "Running scheduled site checks");

    for (url, previous_score) in targets {
        match scanner.scan(&url).await {
            Ok(result) => {
                let decision = evaluate(previous_score, result.score);
                registry
                    .update(&url, result.score, decision.status, Utc::now())
                    .await;

                if decision.alert {
                    warn!(
                        %url,
                        previous_score,
                        new_score = result.score,
                        "Score dropped sharply"
                    );
                    if let Some(tx) = notification_tx {
                        let _ = tx.send(Notification::ScoreAlert {
                            url: url.clone(),
                            previous_score,
                            new_score: result.score,
                            status: decision.status,
                        });
                    }
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "Scheduled check failed");
                registry.mark_failed(&url).await;
                if let Some(tx) = notification_tx {
                    let _ = tx.send(Notification::CheckFailed {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
