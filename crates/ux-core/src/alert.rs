//! Score-delta alerting policy.

use crate::registry::SiteStatus;

/// Outcome of comparing a fresh score against the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertDecision {
    pub status: SiteStatus,
    /// Advisory signal only; it never blocks or alters the status update.
    pub alert: bool,
}

/// Classify a new score and decide whether the drop from the previous score
/// warrants an alert.
///
/// Status bands: below 50 is Critical, below 70 is Warning, otherwise
/// Healthy. An alert fires only on a drop of strictly more than 10 points.
pub fn evaluate(old_score: u8, new_score: u8) -> AlertDecision {
    let status = if new_score < 50 {
        SiteStatus::Critical
    } else if new_score < 70 {
        SiteStatus::Warning
    } else {
        SiteStatus::Healthy
    };

    let alert = i16::from(new_score) < i16::from(old_score) - 10;

    AlertDecision { status, alert }
}
