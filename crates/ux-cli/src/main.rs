mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use ux_core::{
    build_client, notification_channel, DisabledNarrator, GeminiNarrator, MonitorConfig,
    MonitorScheduler, NarrativeGenerator, Notification, ScanEngine, ScanResult, Scanner, Severity,
    SiteRegistry, SiteStatus, WebhookDispatcher,
};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        // Leaked once at startup, lives for the program's lifetime.
        Box::leak(VERSION.to_string().into_boxed_str())
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// UX audit monitor: synthetic quality scores and regression alerts.
#[derive(Parser)]
#[command(name = "ux-monitor", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080). Overrides config file.
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run a one-off audit of a URL and print the report.
    Audit {
        /// URL to audit.
        url: String,

        /// Artificial scan delay in milliseconds.
        #[arg(long, default_value_t = 2000)]
        scan_delay_ms: u64,
    },
    /// Monitor one or more URLs from the command line (no API server).
    Watch {
        /// URLs to monitor.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Check interval in milliseconds.
        #[arg(long, default_value_t = 30000)]
        interval: u64,

        /// Artificial scan delay in milliseconds.
        #[arg(long, default_value_t = 2000)]
        scan_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, config } => {
            run_serve(listen, config).await;
        }
        Commands::Audit { url, scan_delay_ms } => {
            init_cli_tracing();
            run_audit(url, scan_delay_ms).await;
        }
        Commands::Watch {
            urls,
            interval,
            scan_delay_ms,
        } => {
            init_cli_tracing();
            run_watch(urls, interval, scan_delay_ms).await;
        }
    }
}

async fn run_serve(listen_override: Option<SocketAddr>, config_path: Option<PathBuf>) {
    let app_config = if let Some(ref path) = config_path {
        match config::AppConfig::load(path) {
            Ok(c) => {
                init_tracing(&c.server.log_format);
                tracing::info!(path = %path.display(), "Loaded config file");
                Some(c)
            }
            Err(e) => {
                init_tracing("pretty");
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        init_tracing("pretty");
        None
    };

    let listen = listen_override
        .or(app_config.as_ref().map(|c| c.server.listen))
        .unwrap_or_else(|| "0.0.0.0:8080".parse().unwrap());

    let monitor_config = app_config
        .as_ref()
        .map(|c| c.defaults.to_monitor_config())
        .unwrap_or_default();

    let webhooks = app_config
        .as_ref()
        .map(|c| c.webhook.clone())
        .unwrap_or_default();

    let api_key = app_config
        .as_ref()
        .and_then(|c| c.narrative.api_key.clone())
        .or_else(|| std::env::var("GEMINI_API_KEY").ok());
    let model = app_config.as_ref().and_then(|c| c.narrative.model.clone());

    let narrator = build_narrator(api_key.as_deref(), model.as_deref(), &monitor_config);
    let scanner: Arc<dyn Scanner> = Arc::new(ScanEngine::new(narrator, &monitor_config));
    let registry = SiteRegistry::new();

    let (notification_tx, notification_rx) = notification_channel();

    let scheduler = Arc::new(MonitorScheduler::new(
        registry.clone(),
        Arc::clone(&scanner),
        &monitor_config,
        Some(notification_tx.clone()),
    ));

    let webhook_handle = if !webhooks.is_empty() {
        let client = build_client(monitor_config.request_timeout);
        let dispatcher = WebhookDispatcher::new(notification_rx, webhooks, client);
        let handle = tokio::spawn(dispatcher.run());
        tracing::info!("Webhook dispatcher started");
        handle
    } else {
        tokio::spawn(async move {
            let mut rx = notification_rx;
            while rx.recv().await.is_some() {}
        })
    };

    if let Some(ref app_config) = app_config {
        for site in &app_config.sites {
            match registry.add(site.clone()).await {
                Ok(()) => tracing::info!(url = %site, "Monitoring site from config"),
                Err(e) => tracing::warn!(url = %site, error = %e, "Skipping seed site"),
            }
        }
    }

    scheduler.start().await;

    let state = ux_api::state::AppState::new(registry, scanner, Arc::clone(&scheduler));

    tracing::info!(%listen, "Starting UX Monitor API server");
    if let Err(e) = ux_api::serve_with_state(listen, state, ux_api::shutdown_signal()).await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown signal received, stopping monitor...");
    scheduler.stop().await;

    drop(notification_tx);

    match tokio::time::timeout(Duration::from_secs(5), webhook_handle).await {
        Ok(_) => tracing::info!("Webhook dispatcher shut down"),
        Err(_) => tracing::warn!("Webhook dispatcher did not shut down in time, aborting"),
    }

    tracing::info!("Shutdown complete");
}

async fn run_audit(url: String, scan_delay_ms: u64) {
    let config = MonitorConfig::default().with_scan_delay(scan_delay_ms);
    let api_key = std::env::var("GEMINI_API_KEY").ok();
    let narrator = build_narrator(api_key.as_deref(), None, &config);
    let engine = ScanEngine::new(narrator, &config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("valid template"));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Auditing {url}..."));

    let result = match engine.scan(&url).await {
        Ok(result) => result,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    spinner.finish_and_clear();
    print_report(&result);
}

fn print_report(result: &ScanResult) {
    println!(
        "{} {}",
        style("ux-monitor").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!("  {} {}", style("url: ").dim(), style(&result.url).bold());
    println!("  {} {}", style("time:").dim(), result.timestamp);
    println!();
    // Pad before styling: ANSI escapes would otherwise count toward the width.
    println!(
        "  {} {}",
        style(format!("{:<16}", "overall")).bold(),
        score_badge(result.score)
    );
    for (name, value) in [
        ("performance", result.categories.performance),
        ("accessibility", result.categories.accessibility),
        ("best_practices", result.categories.best_practices),
        ("seo", result.categories.seo),
    ] {
        println!(
            "  {} {}",
            style(format!("{name:<16}")).dim(),
            score_badge(value)
        );
    }
    println!();
    println!("{}", style("Summary").bold());
    println!("  {}", result.summary);
    println!();
    println!("{}", style("Strengths").bold());
    for s in &result.strengths {
        println!(
            "  {} {} {}",
            style("+").green().bold(),
            style(s.title).bold(),
            style(format!("[{}]", s.category)).dim()
        );
        println!("    {}", style(s.description).dim());
    }
    println!();
    println!("{}", style("Weaknesses").bold());
    for w in &result.weaknesses {
        println!(
            "  {} {} {}",
            style("!").red().bold(),
            style(w.title).bold(),
            severity_badge(w.severity)
        );
        println!("    {}", style(w.description).dim());
        println!("    {} {}", style("fix:").dim(), w.recommendation);
    }
}

async fn run_watch(urls: Vec<String>, interval: u64, scan_delay_ms: u64) {
    let config = MonitorConfig::default()
        .with_check_interval(interval)
        .with_scan_delay(scan_delay_ms);
    let api_key = std::env::var("GEMINI_API_KEY").ok();
    let narrator = build_narrator(api_key.as_deref(), None, &config);
    let scanner: Arc<dyn Scanner> = Arc::new(ScanEngine::new(narrator, &config));
    let registry = SiteRegistry::new();

    for url in &urls {
        if let Err(e) = registry.add(url.clone()).await {
            eprintln!("{} {url}: {e}", style("skipping").yellow());
        }
    }

    let (notification_tx, mut notification_rx) = notification_channel();
    let scheduler = MonitorScheduler::new(
        registry.clone(),
        scanner,
        &config,
        Some(notification_tx),
    );

    println!(
        "{} {}",
        style("ux-monitor").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    for url in &urls {
        println!("  {} {}", style("url:     ").dim(), style(url).bold());
    }
    println!("  {} {}ms", style("interval:").dim(), interval);
    println!();
    println!("{}", style("Press Ctrl+C to stop").dim());

    let shutdown = ux_api::shutdown_signal();
    tokio::pin!(shutdown);

    let spinner_style =
        ProgressStyle::with_template("{spinner} {msg}").expect("valid template");
    let mut tick_num = 0u64;

    loop {
        tick_num += 1;

        let spinner = ProgressBar::new_spinner().with_style(spinner_style.clone());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_message("Checking sites...");
        scheduler.tick_once().await;
        spinner.finish_and_clear();

        println!("{}", format_separator(tick_num));

        while let Ok(notification) = notification_rx.try_recv() {
            match notification {
                Notification::ScoreAlert {
                    url,
                    previous_score,
                    new_score,
                    ..
                } => {
                    println!(
                        "  {} {} score dropped {} -> {}",
                        style("ALERT").red().bold(),
                        url,
                        previous_score,
                        new_score
                    );
                }
                Notification::CheckFailed { url, reason } => {
                    println!(
                        "  {} {} {}",
                        style("ERROR").red().bold(),
                        url,
                        style(reason).dim()
                    );
                }
            }
        }

        for site in registry.list().await {
            let checked = site
                .last_check
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());
            println!(
                "  {:<40} {} {}  {}",
                site.url,
                status_badge(site.status),
                score_badge(site.score),
                style(checked).dim()
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(config.check_interval) => {}
            _ = &mut shutdown => {
                println!("\n{}", style("Monitor stopped.").dim());
                return;
            }
        }
    }
}

fn build_narrator(
    api_key: Option<&str>,
    model: Option<&str>,
    config: &MonitorConfig,
) -> Arc<dyn NarrativeGenerator> {
    let Some(key) = api_key else {
        return Arc::new(DisabledNarrator);
    };
    match GeminiNarrator::new(key, config) {
        Ok(narrator) => match model {
            Some(model) => Arc::new(narrator.with_model(model)),
            None => Arc::new(narrator),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Narrative generation disabled");
            Arc::new(DisabledNarrator)
        }
    }
}

fn score_badge(score: u8) -> console::StyledObject<String> {
    let text = format!("{score:>3}/100");
    if score >= 70 {
        style(text).green()
    } else if score >= 50 {
        style(text).yellow()
    } else {
        style(text).red()
    }
}

fn status_badge(status: SiteStatus) -> console::StyledObject<String> {
    let text = format!("{:<10}", status.to_string());
    match status {
        SiteStatus::Pending => style(text).dim(),
        SiteStatus::Healthy => style(text).green(),
        SiteStatus::Warning => style(text).yellow(),
        SiteStatus::Critical => style(text).red().bold(),
        SiteStatus::Error => style(text).red(),
    }
}

fn severity_badge(severity: Severity) -> console::StyledObject<&'static str> {
    match severity {
        Severity::High => style("high").red(),
        Severity::Medium => style("medium").yellow(),
        Severity::Low => style("low").dim(),
    }
}

fn format_separator(tick_num: u64) -> String {
    let label = format!(" check {} ", tick_num);
    let width = 54usize.saturating_sub(label.len());
    format!(
        "{}{}{}",
        style("──").dim(),
        style(label).dim().bold(),
        style("─".repeat(width)).dim()
    )
}

fn init_cli_tracing() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .init();
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
