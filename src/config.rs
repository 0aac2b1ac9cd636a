use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{MonitorError, MonitorResult};
use crate::estimators::manifold::FrechetConfig;
use crate::regime::{self, RegimeSpec};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LookbackConfig {
    /// Yahoo chart range, e.g. "6mo".
    pub range: String,
    /// Yahoo chart interval, e.g. "1d" or "1h".
    pub interval: String,
}

impl Default for LookbackConfig {
    fn default() -> Self {
        Self { range: "6mo".into(), interval: "1d".into() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VolConfig {
    pub window: usize,
    pub periods_per_year: f64,
}

impl Default for VolConfig {
    fn default() -> Self {
        Self { window: 20, periods_per_year: 252.0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HurstConfig {
    pub max_lag: usize,
}

impl Default for HurstConfig {
    fn default() -> Self {
        Self { max_lag: 20 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OptionsConfig {
    pub enabled: bool,
    pub max_expiries: usize,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self { enabled: true, max_expiries: 5 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegimeConfig {
    pub num_paths: usize,
    pub steps: usize,
    pub dt: f64,
    pub seed: u64,
    pub frechet: FrechetConfig,
    pub regimes: Vec<RegimeSpec>,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            num_paths: 500,
            steps: 100,
            dt: 0.01,
            seed: 42,
            frechet: FrechetConfig::default(),
            regimes: regime::default_regimes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SplineConfig {
    /// Number of most recent bars fitted.
    pub path_len: usize,
    /// Samples of the fitted curve handed to the renderer.
    pub samples: usize,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self { path_len: 64, samples: 200 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BacktestConfig {
    pub rsi_window: usize,
    pub rsi_exit: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self { rsi_window: 14, rsi_exit: 70.0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: false, port: 8765 }
    }
}

/// Styling handed to the chart renderer with every report.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChartStyle {
    pub figure_background: String,
    pub axes_background: String,
    pub text_color: String,
    pub grid_color: String,
    pub font_family: String,
    pub font_size: f64,
    /// One color per regime, in regime order.
    pub palette: Vec<String>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            figure_background: "#0a0a14".into(),
            axes_background: "#0d0d1a".into(),
            text_color: "#e0e0e0".into(),
            grid_color: "#1a1a2e".into(),
            font_family: "monospace".into(),
            font_size: 10.0,
            palette: vec!["#00e5ff".into(), "#ff3d00".into(), "#ffab00".into(), "#69f0ae".into()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub symbols: Vec<String>,

    /// Optional. Empty disables Slack delivery.
    pub slack_webhook_url: String,

    /// Where the latest reports are written as JSON.
    pub state_path: String,

    /// Seconds between runs; 0 runs once and exits.
    pub refresh_secs: u64,

    pub lookback: LookbackConfig,
    pub realized_vol: VolConfig,
    pub hurst: HurstConfig,
    pub options: OptionsConfig,
    pub manifold: RegimeConfig,
    pub spline: SplineConfig,
    pub backtest: BacktestConfig,
    pub telemetry: TelemetryConfig,
    pub chart: ChartStyle,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["NVDA".into()],
            slack_webhook_url: String::new(),
            state_path: "state.json".into(),
            refresh_secs: 0,
            lookback: LookbackConfig::default(),
            realized_vol: VolConfig::default(),
            hurst: HurstConfig::default(),
            options: OptionsConfig::default(),
            manifold: RegimeConfig::default(),
            spline: SplineConfig::default(),
            backtest: BacktestConfig::default(),
            telemetry: TelemetryConfig::default(),
            chart: ChartStyle::default(),
        }
    }
}

impl MonitorConfig {
    /// Loads configuration from the 'config.yaml' file in the current working directory.
    pub fn load() -> MonitorResult<Self> {
        Self::load_from("config.yaml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let yaml_content = fs::read_to_string(path).map_err(|e| {
            MonitorError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml: &str) -> MonitorResult<Self> {
        let config: MonitorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the estimators cannot run with.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.symbols.iter().all(|s| s.trim().is_empty()) {
            return Err(MonitorError::config("symbols list is empty"));
        }
        if self.hurst.max_lag < 2 {
            return Err(MonitorError::config("hurst.max_lag must be at least 2"));
        }
        if self.realized_vol.window == 0 || self.realized_vol.periods_per_year <= 0.0 {
            return Err(MonitorError::config("realized_vol.window and periods_per_year must be positive"));
        }
        if self.manifold.dt <= 0.0 || self.manifold.steps < 3 {
            return Err(MonitorError::config("manifold.dt must be positive and steps at least 3"));
        }
        if self.manifold.frechet.lr <= 0.0 || self.manifold.frechet.tol <= 0.0 {
            return Err(MonitorError::config("manifold.frechet lr and tol must be positive"));
        }
        if self.backtest.rsi_window == 0 {
            return Err(MonitorError::config("backtest.rsi_window must be positive"));
        }
        Ok(())
    }

    pub fn slack_enabled(&self) -> bool {
        !self.slack_webhook_url.trim().is_empty()
    }
}
