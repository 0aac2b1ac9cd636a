use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, Utc};

use regime_monitor::config::MonitorConfig;
use regime_monitor::data::MarketDataProvider;
use regime_monitor::error::{MonitorError, MonitorResult};
use regime_monitor::estimators::gex;
use regime_monitor::models::{OptionChain, OptionQuote, OptionSide, PriceSeries};
use regime_monitor::telemetry::TelemetryServer;
use regime_monitor::{build_report, fetch_snapshot, regime, run_diagnostics, MarketSnapshot};

/// Serves fixed data; `None` fields answer with an upstream error.
struct StaticProvider {
    closes: Option<Vec<f64>>,
    chain: Option<OptionChain>,
}

impl MarketDataProvider for StaticProvider {
    async fn price_history(&self, symbol: &str, _range: &str, _interval: &str) -> MonitorResult<PriceSeries> {
        self.closes
            .clone()
            .map(|c| PriceSeries::from_closes(symbol, c))
            .ok_or_else(|| MonitorError::network("offline"))
    }

    async fn spot(&self, _symbol: &str) -> MonitorResult<f64> {
        Err(MonitorError::network("offline"))
    }

    async fn option_expiries(&self, _symbol: &str) -> MonitorResult<Vec<NaiveDate>> {
        self.chain
            .as_ref()
            .map(|c| vec![c.expiry])
            .ok_or_else(|| MonitorError::network("offline"))
    }

    async fn option_chain(&self, _symbol: &str, _expiry: NaiveDate) -> MonitorResult<OptionChain> {
        self.chain.clone().ok_or_else(|| MonitorError::network("offline"))
    }
}

fn constant_return_closes(n_returns: usize, r: f64) -> Vec<f64> {
    (0..=n_returns).map(|i| 100.0 * (r * i as f64).exp()).collect()
}

fn atm_call_chain(spot: f64, expiry: NaiveDate) -> OptionChain {
    let mut chain = OptionChain::new(expiry);
    chain.push(OptionQuote {
        strike: spot,
        open_interest: 1000,
        implied_vol: 0.3,
        expiry,
        side: OptionSide::Call,
    });
    chain
}

fn test_config(state_file: &str) -> MonitorConfig {
    let mut cfg = MonitorConfig::from_yaml_str("symbols: [TEST]\nmanifold:\n  num_paths: 60\n").unwrap();
    cfg.state_path = std::env::temp_dir().join(state_file).to_string_lossy().into_owned();
    cfg
}

#[test]
fn constant_returns_and_atm_call_end_to_end() {
    let cfg = test_config("unused.json");
    let as_of = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let closes = constant_return_closes(21, 0.01);
    let spot = *closes.last().unwrap();

    let snapshot = MarketSnapshot {
        series: PriceSeries::from_closes("TEST", closes),
        spot: Some(spot),
        chains: vec![atm_call_chain(spot, as_of + Duration::days(30))],
    };
    let calibration = regime::calibrate(&cfg.manifold);
    let report = build_report("TEST", &snapshot, &cfg, &calibration, as_of);

    assert_relative_eq!(report.rv_20d.unwrap(), 0.01 * 252f64.sqrt(), epsilon = 1e-9);

    let gamma = gex::bsm_gamma(spot, spot, 0.3, gex::year_fraction(30));
    assert!(gamma > 0.0);

    // Calls carry negative dealer exposure.
    let profile = report.gex_profile.value();
    assert_eq!(profile.len(), 1);
    assert!(profile[0].gex < 0.0);
    assert!(report.net_gex < 0.0);

    assert_relative_eq!(report.vol, 0.3);
    assert_eq!(report.term_structure.len(), 1);
    assert_eq!(report.term_structure[0].days, 30);
    assert!(!report.vol_surface_fallback);

    // 21 returns cannot feed a 20-lag Hurst estimate.
    assert_eq!(*report.hurst_price.value(), 0.5);
    assert!(report.hurst_price.is_fallback());

    assert_eq!(report.regimes.centroids.len(), 4);
    assert!(report.regime.is_some());
    assert!(!report.spline_samples.is_empty());
}

#[tokio::test]
async fn offline_provider_degrades_to_defaults() {
    let cfg = test_config("regime_monitor_offline_state.json");
    let provider = StaticProvider { closes: None, chain: None };
    let telemetry = TelemetryServer::disabled();

    let reports = run_diagnostics(&provider, &cfg, &telemetry).await.unwrap();
    assert_eq!(reports.len(), 1);
    let r = &reports[0];

    assert_eq!(r.bars, 0);
    assert!(r.rv_20d.is_none());
    assert_eq!(*r.hurst_price.value(), 0.5);
    assert_eq!(*r.hurst_vol.value(), 0.5);
    assert!(r.gex_profile.is_fallback());
    assert!(r.gex_profile.value().is_empty());
    assert_eq!((r.vol, r.skew, r.fly), (0.30, -0.04, 0.015));
    assert!(r.vol_surface_fallback);
    assert!(r.term_structure.is_empty());
    assert!(r.roughness.is_fallback());
    assert!(r.regime.is_none());

    let written = std::fs::read_to_string(&cfg.state_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json[0]["symbol"], "TEST");
    assert_eq!(json[0]["hurst_price"]["status"], "fallback");
}

#[tokio::test]
async fn full_run_publishes_reports() {
    let cfg = test_config("regime_monitor_full_state.json");
    let today = Utc::now().date_naive();

    let closes: Vec<f64> = (0..180)
        .map(|i| 100.0 * (0.002 * i as f64 + 0.02 * (i as f64 * 0.7).sin()).exp())
        .collect();
    let spot = *closes.last().unwrap();
    let provider = StaticProvider {
        closes: Some(closes),
        chain: Some(atm_call_chain(spot, today + Duration::days(30))),
    };

    let telemetry = TelemetryServer::disabled();
    let mut rx = telemetry.subscribe();

    let reports = run_diagnostics(&provider, &cfg, &telemetry).await.unwrap();
    let r = &reports[0];
    assert_eq!(r.bars, 180);
    assert!(!r.hurst_price.is_fallback());
    let h = *r.hurst_price.value();
    assert!((0.0..=1.0).contains(&h));
    assert!(!r.roughness.is_fallback());
    assert!(r.geometry_vs_topology.is_some());
    assert_eq!(r.spline_samples.len(), cfg.spline.samples);

    let packet: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(packet["msg_type"], "REPORT");
    assert_eq!(packet["symbol"], "TEST");
}

#[tokio::test]
async fn snapshot_skips_past_expiries() {
    let cfg = test_config("unused.json");
    let today = Utc::now().date_naive();
    let provider = StaticProvider {
        closes: Some(vec![100.0, 101.0]),
        chain: Some(atm_call_chain(100.0, today - Duration::days(3))),
    };
    let snap = fetch_snapshot(&provider, &cfg, "TEST", today).await;
    assert!(snap.chains.is_empty());
    assert_eq!(snap.effective_spot(), Some(101.0));
}
