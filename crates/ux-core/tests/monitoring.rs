//! End-to-end tests for the registry + scheduler + alert policy, driven by
//! scripted scanners instead of the real engine.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::Arc;

use async_trait::async_trait;

use ux_core::{
    notification_channel, MonitorConfig, MonitorScheduler, Notification, ScanError, ScanResult,
    Scanner, SchedulerState, SiteRegistry, SiteStatus, STRENGTH_CATALOG, WEAKNESS_CATALOG,
};

fn make_result(url: &str, score: u8) -> ScanResult {
    ScanResult {
        url: url.to_string(),
        timestamp: "2026-08-04 12:00 UTC".to_string(),
        score,
        categories: ux_core::CategoryScores {
            performance: score,
            accessibility: score,
            best_practices: score,
            seo: score,
        },
        summary: "scripted".to_string(),
        strengths: STRENGTH_CATALOG[..3].to_vec(),
        weaknesses: WEAKNESS_CATALOG[..3].to_vec(),
    }
}

/// Replays a per-URL script of scores and failures, one step per scan.
struct ScriptedScanner {
    scripts: Mutex<HashMap<String, VecDeque<Result<u8, String>>>>,
}

impl ScriptedScanner {
    fn new(scripts: &[(&str, Vec<Result<u8, String>>)]) -> Self {
        Self {
            scripts: Mutex::new(
                scripts
                    .iter()
                    .map(|(url, steps)| (url.to_string(), steps.clone().into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl Scanner for ScriptedScanner {
    async fn scan(&self, url: &str) -> Result<ScanResult, ScanError> {
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|steps| steps.pop_front());
        match step {
            Some(Ok(score)) => Ok(make_result(url, score)),
            Some(Err(reason)) => Err(ScanError::Failed(reason)),
            None => Err(ScanError::Failed(format!("no scripted result for {url}"))),
        }
    }

    async fn suggest_fix(&self) -> String {
        "scripted".to_string()
    }
}

/// Always succeeds with the same score, for any URL.
struct FixedScanner(u8);

#[async_trait]
impl Scanner for FixedScanner {
    async fn scan(&self, url: &str) -> Result<ScanResult, ScanError> {
        Ok(make_result(url, self.0))
    }

    async fn suggest_fix(&self) -> String {
        "fixed".to_string()
    }
}

fn scheduler_with(
    registry: &SiteRegistry,
    scanner: Arc<dyn Scanner>,
    tx: Option<tokio::sync::mpsc::UnboundedSender<Notification>>,
) -> MonitorScheduler {
    MonitorScheduler::new(
        registry.clone(),
        scanner,
        &MonitorConfig::default().with_scan_delay(0).with_check_interval(100),
        tx,
    )
}

fn site<'a>(sites: &'a [ux_core::MonitoredSite], url: &str) -> &'a ux_core::MonitoredSite {
    sites
        .iter()
        .find(|s| s.url == url)
        .unwrap_or_else(|| panic!("site not found: {url}"))
}

#[tokio::test]
async fn tick_updates_every_registered_site() {
    let registry = SiteRegistry::new();
    registry.add("https://a.com").await.unwrap();
    registry.add("https://b.com").await.unwrap();

    let scanner = Arc::new(ScriptedScanner::new(&[
        ("https://a.com", vec![Ok(85)]),
        ("https://b.com", vec![Ok(60)]),
    ]));
    let scheduler = scheduler_with(&registry, scanner, None);

    scheduler.tick_once().await;

    let sites = registry.list().await;
    let a = site(&sites, "https://a.com");
    assert_eq!(a.score, 85);
    assert_eq!(a.status, SiteStatus::Healthy);
    assert!(a.last_check.is_some());

    let b = site(&sites, "https://b.com");
    assert_eq!(b.score, 60);
    assert_eq!(b.status, SiteStatus::Warning);
    assert!(scheduler.last_tick().await.is_some());
}

#[tokio::test]
async fn failing_site_is_isolated_from_the_rest_of_the_tick() {
    let registry = SiteRegistry::new();
    registry.add("https://broken.com").await.unwrap();
    registry.add("https://fine.com").await.unwrap();

    let scanner = Arc::new(ScriptedScanner::new(&[
        ("https://broken.com", vec![Ok(75), Err("boom".to_string())]),
        ("https://fine.com", vec![Ok(80), Ok(90)]),
    ]));
    let scheduler = scheduler_with(&registry, scanner, None);

    scheduler.tick_once().await;
    scheduler.tick_once().await;

    let sites = registry.list().await;
    let broken = site(&sites, "https://broken.com");
    assert_eq!(broken.status, SiteStatus::Error);
    // Score survives the failed check.
    assert_eq!(broken.score, 75);

    let fine = site(&sites, "https://fine.com");
    assert_eq!(fine.status, SiteStatus::Healthy);
    assert_eq!(fine.score, 90);
}

#[tokio::test]
async fn sharp_drop_emits_score_alert() {
    let registry = SiteRegistry::new();
    registry.add("https://a.com").await.unwrap();

    let (tx, mut rx) = notification_channel();
    let scanner = Arc::new(ScriptedScanner::new(&[(
        "https://a.com",
        vec![Ok(80), Ok(60)],
    )]));
    let scheduler = scheduler_with(&registry, scanner, Some(tx));

    // First check goes from 0 to 80: no alert.
    scheduler.tick_once().await;
    assert!(rx.try_recv().is_err());

    scheduler.tick_once().await;
    match rx.try_recv().expect("alert should have been emitted") {
        Notification::ScoreAlert {
            url,
            previous_score,
            new_score,
            status,
        } => {
            assert_eq!(url, "https://a.com");
            assert_eq!(previous_score, 80);
            assert_eq!(new_score, 60);
            assert_eq!(status, SiteStatus::Warning);
        }
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn small_drop_does_not_alert() {
    let registry = SiteRegistry::new();
    registry.add("https://a.com").await.unwrap();

    let (tx, mut rx) = notification_channel();
    let scanner = Arc::new(ScriptedScanner::new(&[(
        "https://a.com",
        vec![Ok(80), Ok(72)],
    )]));
    let scheduler = scheduler_with(&registry, scanner, Some(tx));

    scheduler.tick_once().await;
    scheduler.tick_once().await;

    assert!(rx.try_recv().is_err());
    assert_eq!(
        site(&registry.list().await, "https://a.com").status,
        SiteStatus::Healthy
    );
}

#[tokio::test]
async fn failed_check_emits_check_failed_notification() {
    let registry = SiteRegistry::new();
    registry.add("https://a.com").await.unwrap();

    let (tx, mut rx) = notification_channel();
    let scanner = Arc::new(ScriptedScanner::new(&[(
        "https://a.com",
        vec![Err("connection refused".to_string())],
    )]));
    let scheduler = scheduler_with(&registry, scanner, Some(tx));

    scheduler.tick_once().await;

    match rx.try_recv().expect("failure notification expected") {
        Notification::CheckFailed { url, reason } => {
            assert_eq!(url, "https://a.com");
            assert!(reason.contains("connection refused"));
        }
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn empty_registry_tick_is_a_noop() {
    let registry = SiteRegistry::new();
    let scheduler = scheduler_with(&registry, Arc::new(FixedScanner(80)), None);

    scheduler.tick_once().await;

    assert!(registry.is_empty().await);
    assert!(scheduler.last_tick().await.is_some());
}

/// Removes its target from the registry while the scan is in flight, then
/// reports success. The write-back must not resurrect the site.
struct RemovingScanner {
    registry: SiteRegistry,
}

#[async_trait]
impl Scanner for RemovingScanner {
    async fn scan(&self, url: &str) -> Result<ScanResult, ScanError> {
        self.registry.remove(url).await;
        Ok(make_result(url, 90))
    }

    async fn suggest_fix(&self) -> String {
        "removing".to_string()
    }
}

#[tokio::test]
async fn site_removed_mid_tick_is_not_resurrected() {
    let registry = SiteRegistry::new();
    registry.add("https://a.com").await.unwrap();

    let scanner = Arc::new(RemovingScanner {
        registry: registry.clone(),
    });
    let scheduler = scheduler_with(&registry, scanner, None);

    scheduler.tick_once().await;

    assert!(registry.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn scheduler_start_and_stop_lifecycle() {
    let registry = SiteRegistry::new();
    let scheduler = scheduler_with(&registry, Arc::new(FixedScanner(80)), None);

    assert_eq!(scheduler.state().await, SchedulerState::Idle);

    scheduler.start().await;
    assert_eq!(scheduler.state().await, SchedulerState::Active);

    // Starting again while active is a no-op.
    scheduler.start().await;
    assert_eq!(scheduler.state().await, SchedulerState::Active);

    scheduler.stop().await;

    let mut stopped = false;
    for _ in 0..50 {
        tokio::time::sleep(scheduler.check_interval()).await;
        if scheduler.state().await == SchedulerState::Stopped {
            stopped = true;
            break;
        }
    }
    assert!(stopped, "scheduler should settle at Stopped");
}

#[tokio::test(start_paused = true)]
async fn background_loop_checks_sites_on_interval() {
    let registry = SiteRegistry::new();
    registry.add("https://a.com").await.unwrap();

    let scheduler = scheduler_with(&registry, Arc::new(FixedScanner(88)), None);
    scheduler.start().await;

    let mut checked = false;
    for _ in 0..50 {
        tokio::time::sleep(scheduler.check_interval()).await;
        let sites = registry.list().await;
        if sites[0].score == 88 {
            checked = true;
            break;
        }
    }
    assert!(checked, "background loop should have scanned the site");
    assert_eq!(
        site(&registry.list().await, "https://a.com").status,
        SiteStatus::Healthy
    );

    scheduler.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_add_remove_and_ticks_keep_registry_consistent() {
    let registry = SiteRegistry::new();
    let scheduler = Arc::new(scheduler_with(&registry, Arc::new(FixedScanner(80)), None));

    for round in 0..20 {
        let mut handles = Vec::new();

        for i in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let _ = registry.add(format!("https://site-{i}.com")).await;
            }));
        }
        for i in 0..4 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.remove(&format!("https://site-{i}.com")).await;
            }));
        }
        {
            let scheduler = Arc::clone(&scheduler);
            handles.push(tokio::spawn(async move {
                scheduler.tick_once().await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let sites = registry.list().await;
        let urls: HashSet<&str> = sites.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls.len(),
            sites.len(),
            "duplicate entries after round {round}"
        );
        for s in &sites {
            // Every record is either untouched or a complete write-back.
            match s.status {
                SiteStatus::Pending => {
                    assert_eq!(s.score, 0);
                    assert!(s.last_check.is_none());
                }
                SiteStatus::Healthy => {
                    assert_eq!(s.score, 80);
                    assert!(s.last_check.is_some());
                }
                other => panic!("unexpected status {other} for {}", s.url),
            }
        }

        // Reset for the next round.
        for s in sites {
            registry.remove(&s.url).await;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_adds_accept_exactly_one() {
    for _ in 0..20 {
        let registry = SiteRegistry::new();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.add("https://same.com").await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(registry.len().await, 1);
    }
}
