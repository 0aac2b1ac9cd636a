use tokio::time::{sleep, Duration};
use tracing::{info, error};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

use regime_monitor::config::MonitorConfig;
use regime_monitor::data::yahoo::YahooClient;
use regime_monitor::run_diagnostics;
use regime_monitor::telemetry::TelemetryServer;

/// Formats log timestamps in the system's local timezone instead of UTC.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f"))
    }
}

#[tokio::main]
async fn main() {
    // RUST_LOG controls the level, "info" when unset.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_timer(LocalTimer)
        .init();

    // Fail fast: nothing runs without a valid config.
    let loaded = match std::env::args().nth(1) {
        Some(path) => MonitorConfig::load_from(path),
        None => MonitorConfig::load(),
    };
    let cfg = match loaded {
        Ok(c) => c,
        Err(e) => {
            error!("❌ Critical Error: Failed to load configuration: {}", e);
            return;
        }
    };

    let provider = match YahooClient::new() {
        Ok(p) => p,
        Err(e) => {
            error!("❌ Critical Error: {}", e);
            return;
        }
    };

    let telemetry = TelemetryServer::new(cfg.telemetry.enabled, cfg.telemetry.port);

    loop {
        info!("🚀 Running regime diagnostics for {:?}...", cfg.symbols);

        if let Err(e) = run_diagnostics(&provider, &cfg, &telemetry).await {
            error!("⚠️ Diagnostic run failed: {}", e);
        }

        if cfg.refresh_secs == 0 {
            break;
        }
        sleep(Duration::from_secs(cfg.refresh_secs)).await;
    }
}
