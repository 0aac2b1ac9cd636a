// src/lib.rs

pub mod common;
pub mod indicators;
pub mod estimators;
pub mod config;
pub mod error;
pub mod stats;
pub mod models;
pub mod data;
pub mod regime;
pub mod backtest;
pub mod report;
pub mod notifier;
pub mod telemetry;

use crate::config::MonitorConfig;
use crate::data::MarketDataProvider;
use crate::error::{Degradation, Estimate, MonitorResult};
use crate::estimators::manifold::ManifoldPoint;
use crate::estimators::{gex, hurst, spline, term_structure};
use crate::indicators::vol;
use crate::models::{OptionChain, PriceSeries};
use crate::regime::RegimeCalibration;
use crate::report::{DiagnosticReport, GeometryVsTopology};
use crate::telemetry::TelemetryServer;

use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use std::fs;
use std::path::Path;
use tracing::{info, warn, debug};

/// Raw inputs for one symbol, as delivered by the market-data collaborator.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub series: PriceSeries,
    pub spot: Option<f64>,
    /// Nearest expiries first.
    pub chains: Vec<OptionChain>,
}

impl MarketSnapshot {
    /// Quoted spot, else the last close.
    pub fn effective_spot(&self) -> Option<f64> {
        self.spot
            .filter(|s| s.is_finite() && *s > 0.0)
            .or_else(|| self.series.last_close())
    }
}

/// Fetches everything one symbol needs. Upstream failures are logged and
/// leave the corresponding part of the snapshot empty.
pub async fn fetch_snapshot<P: MarketDataProvider>(
    provider: &P,
    cfg: &MonitorConfig,
    symbol: &str,
    as_of: NaiveDate,
) -> MarketSnapshot {
    let series = match provider.price_history(symbol, &cfg.lookback.range, &cfg.lookback.interval).await {
        Ok(s) => s,
        Err(e) => {
            warn!("⚠️ Price history unavailable for {}: {}", symbol, e);
            PriceSeries::from_closes(symbol, Vec::new())
        }
    };

    let spot = match provider.spot(symbol).await {
        Ok(p) => Some(p),
        Err(e) => {
            debug!(symbol, error = %e, "spot unavailable, using last close");
            None
        }
    };

    let mut chains = Vec::new();
    if cfg.options.enabled {
        match provider.option_expiries(symbol).await {
            Ok(expiries) => {
                for expiry in expiries.into_iter().filter(|d| *d >= as_of).take(cfg.options.max_expiries) {
                    match provider.option_chain(symbol, expiry).await {
                        Ok(chain) => chains.push(chain),
                        Err(e) => warn!("⚠️ Option chain {} {} unavailable: {}", symbol, expiry, e),
                    }
                }
            }
            Err(e) => warn!("⚠️ Option expiries unavailable for {}: {}", symbol, e),
        }
    }

    MarketSnapshot { series, spot, chains }
}

/// Runs every estimator over one snapshot. Never fails: each part degrades
/// to its documented default independently.
pub fn build_report(
    symbol: &str,
    snapshot: &MarketSnapshot,
    cfg: &MonitorConfig,
    calibration: &RegimeCalibration,
    as_of: NaiveDate,
) -> DiagnosticReport {
    let closes = &snapshot.series.closes;
    let returns = snapshot.series.log_returns();
    let spot = snapshot.effective_spot();

    // --- Volatility & persistence ---
    let rv_cfg = &cfg.realized_vol;
    let rv_20d = vol::realized_vol(closes, rv_cfg.window, rv_cfg.periods_per_year);
    let hurst_price = hurst::hurst_exponent(returns.as_slice(), cfg.hurst.max_lag);
    let vol_series = vol::realized_vol_series(closes, rv_cfg.window, rv_cfg.periods_per_year);
    let hurst_vol = hurst::hurst_exponent(&vol_series, cfg.hurst.max_lag);

    // --- Options ---
    let spot_or_nan = spot.unwrap_or(f64::NAN);
    let gex_profile = match snapshot.chains.iter().min_by_key(|c| c.expiry) {
        Some(nearest) => gex::gex_profile(nearest, spot_or_nan, as_of),
        None => Estimate::fallback(Vec::new(), Degradation::upstream("no option chains")),
    };
    let net_gex = gex::net_gex(gex_profile.value());

    let surface = term_structure::build_term_structure(
        &snapshot.chains,
        spot_or_nan,
        as_of,
        cfg.options.max_expiries,
    );
    let vol_surface_fallback = surface.is_fallback();
    let surface = surface.into_value();

    // --- Geometry ---
    let dt = 1.0 / rv_cfg.periods_per_year;
    let manifold_point = ManifoldPoint::from_log_returns(returns.as_slice(), dt);
    let regime = manifold_point.as_ref().and_then(|p| calibration.classify(p));

    let path = snapshot.series.tail_log_path(cfg.spline.path_len);
    let rough = spline::estimate_roughness(&path, cfg.spline.samples);
    let geometry_vs_topology = match (&regime, &rough.roughness) {
        (Some(a), Estimate::Computed { value }) => Some(GeometryVsTopology {
            fisher_distance: a.distance,
            log_roughness: value.ln_1p(),
        }),
        _ => None,
    };

    // --- Signals ---
    let signals = backtest::compare_signals(closes, cfg.backtest.rsi_window, cfg.backtest.rsi_exit);

    DiagnosticReport {
        symbol: symbol.to_string(),
        generated_at: Utc::now(),
        bars: closes.len(),
        spot,
        rv_20d,
        hurst_price,
        hurst_vol,
        gex_profile,
        net_gex,
        vol: surface.vol,
        skew: surface.skew,
        fly: surface.fly,
        term_structure: surface.term_structure,
        vol_surface_fallback,
        manifold_point,
        regimes: calibration.clone(),
        regime,
        roughness: rough.roughness,
        spline_samples: rough.fitted,
        geometry_vs_topology,
        signals,
        chart: cfg.chart.clone(),
    }
}

/// Overwrites the ephemeral state file with the latest reports.
pub fn write_state(path: impl AsRef<Path>, reports: &[DiagnosticReport]) -> MonitorResult<()> {
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json)?;
    Ok(())
}

/// One diagnostic pass over every configured symbol.
///
/// Symbols are processed concurrently; the regime calibration is shared.
/// Reports are written to the state file, published on telemetry and,
/// when a webhook is configured, summarized to Slack.
pub async fn run_diagnostics<P: MarketDataProvider>(
    provider: &P,
    cfg: &MonitorConfig,
    telemetry: &TelemetryServer,
) -> MonitorResult<Vec<DiagnosticReport>> {
    let as_of = Utc::now().date_naive();
    let calibration = regime::calibrate(&cfg.manifold);
    info!("🧭 Calibrated {} regime centroids", calibration.centroids.len());

    let symbols: Vec<&str> = cfg.symbols
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let reports: Vec<DiagnosticReport> = join_all(symbols.iter().map(|symbol| {
        let calibration = &calibration;
        async move {
            let snapshot = fetch_snapshot(provider, cfg, symbol, as_of).await;
            build_report(symbol, &snapshot, cfg, calibration, as_of)
        }
    }))
    .await;

    for report in &reports {
        info!(
            symbol = %report.symbol,
            hurst_price = format!("{:.3}", report.hurst_price.value()),
            vol = format!("{:.4}", report.vol),
            regime = report.regime.as_ref().map(|r| r.regime.as_str()).unwrap_or("n/a"),
            "📊 Diagnostics complete"
        );
        telemetry.publish(report);

        if cfg.slack_enabled() {
            notifier::send_report_summary(&cfg.slack_webhook_url, &report.symbol, report.summary()).await;
            if report.signals.geometric_active {
                let regime = report.regime.as_ref().map(|r| r.regime.as_str()).unwrap_or("n/a");
                notifier::send_exhaustion_alert(
                    &cfg.slack_webhook_url,
                    &report.symbol,
                    report.spot.unwrap_or_default(),
                    regime,
                )
                .await;
            }
        }
    }

    write_state(&cfg.state_path, &reports)?;
    info!("💾 State written to {}", cfg.state_path);

    Ok(reports)
}
