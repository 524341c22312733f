mod marker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scorecard_core::{
    load_config, validate_config, JiraTracker, QueryEngine, QuboleEngine, ReportOrchestrator,
    SanitizedConfig, Tracker,
};

use marker::{marker_path, purge_stale_logs};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Failures can happen before logging is up, so fatal errors go to stderr.
    if let Err(e) = run().await {
        eprintln!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var("SCORECARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("scorecard.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {config_path:?}"))?;
    validate_config(&config).context("Configuration validation failed")?;

    let today = Local::now().date_naive();
    let marker = marker_path(&config.logs.dir, &config.report.app_name, today);
    if marker.exists() {
        eprintln!(
            "The report for this week has already run ({}); nothing to do.",
            marker.display()
        );
        return Ok(());
    }

    // The marker file doubles as this run's log sink; creating it claims the
    // week.
    let _guard = init_logging(&marker)?;

    info!("Starting scorecard v{}", VERSION);
    info!("Configuration loaded from {config_path:?}");
    info!("Configuration: {:?}", SanitizedConfig::from(&config));

    // Hash the full config so runs are attributable to the exact settings.
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    let tracker: Arc<dyn Tracker> = Arc::new(JiraTracker::new(config.tracker.clone()));
    info!("Using tracker: {}", tracker.name());
    let engine: Arc<dyn QueryEngine> = Arc::new(QuboleEngine::new(config.engine.clone()));
    info!("Using query engine: {}", engine.name());

    let log_dir = config.logs.dir.clone();
    let retention_days = config.logs.retention_days;

    let orchestrator = ReportOrchestrator::new(config, tracker, engine);
    let summary = orchestrator.run(today).await?;

    info!(
        run_id = %summary.run_id,
        tickets_found = summary.tickets_found,
        units_reported = summary.batch.units_reported,
        alerts_posted = summary.alerts_posted(),
        faults = summary.batch.faults,
        "Weekly report finished"
    );

    // The report is already posted; a failed purge is not worth a bad exit.
    if let Err(e) = purge_stale_logs(&log_dir, retention_days) {
        warn!("Log purge failed: {e:#}");
    }

    Ok(())
}

/// Set up console plus file logging, writing the file to this run's marker.
fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let parent = match log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create the log directory {}", parent.display()))?;
    let file = std::fs::File::create(log_file)
        .with_context(|| format!("Failed to create the run log {}", log_file.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(true);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to init logging: {e}"))?;

    Ok(guard)
}
