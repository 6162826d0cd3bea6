use std::fmt::Write;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use ux_core::SiteStatus;

use crate::state::AppState;

const STATUS_LABELS: [(SiteStatus, &str); 5] = [
    (SiteStatus::Pending, "pending"),
    (SiteStatus::Healthy, "healthy"),
    (SiteStatus::Warning, "warning"),
    (SiteStatus::Critical, "critical"),
    (SiteStatus::Error, "error"),
];

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut out = String::with_capacity(2048);

    let sites = state.registry.list().await;

    writeln!(out, "# TYPE ux_monitor_sites gauge").unwrap();
    writeln!(out, "# HELP ux_monitor_sites Number of sites being monitored").unwrap();
    writeln!(out, "ux_monitor_sites {}", sites.len()).unwrap();

    writeln!(out, "# TYPE ux_monitor_site_score gauge").unwrap();
    writeln!(
        out,
        "# HELP ux_monitor_site_score Latest overall score per monitored site"
    )
    .unwrap();
    for site in &sites {
        writeln!(
            out,
            "ux_monitor_site_score{{url=\"{}\"}} {}",
            site.url, site.score
        )
        .unwrap();
    }

    writeln!(out, "# TYPE ux_monitor_site_status stateset").unwrap();
    writeln!(
        out,
        "# HELP ux_monitor_site_status Current status per monitored site"
    )
    .unwrap();
    for site in &sites {
        for (status, label) in STATUS_LABELS {
            writeln!(
                out,
                "ux_monitor_site_status{{url=\"{}\",status=\"{}\"}} {}",
                site.url,
                label,
                if site.status == status { 1 } else { 0 }
            )
            .unwrap();
        }
    }

    writeln!(out, "# TYPE ux_monitor_scheduler_state stateset").unwrap();
    writeln!(
        out,
        "# HELP ux_monitor_scheduler_state Current state of the monitor scheduler"
    )
    .unwrap();
    let scheduler_state = state.scheduler.state().await.to_string();
    for variant in &["idle", "active", "stopping", "stopped"] {
        writeln!(
            out,
            "ux_monitor_scheduler_state{{state=\"{}\"}} {}",
            variant,
            if scheduler_state == *variant { 1 } else { 0 }
        )
        .unwrap();
    }

    writeln!(out, "# TYPE ux_monitor_last_tick_timestamp_seconds gauge").unwrap();
    writeln!(
        out,
        "# HELP ux_monitor_last_tick_timestamp_seconds Unix timestamp of the last scheduler tick"
    )
    .unwrap();
    if let Some(t) = state.scheduler.last_tick().await {
        let secs = t.timestamp() as f64 + (t.timestamp_subsec_millis() as f64 / 1000.0);
        writeln!(out, "ux_monitor_last_tick_timestamp_seconds {:.3}", secs).unwrap();
    }

    writeln!(out, "# EOF").unwrap();

    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        out,
    )
}
