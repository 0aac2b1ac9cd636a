//! Diagnostic report handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backtest::SignalComparison;
use crate::config::ChartStyle;
use crate::error::Estimate;
use crate::estimators::manifold::ManifoldPoint;
use crate::estimators::spline::SplineSample;
use crate::models::{GexEntry, TermPoint};
use crate::regime::{RegimeAssessment, RegimeCalibration};

/// Fisher distance next to log1p(roughness), the "geometry vs topology" pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeometryVsTopology {
    pub fisher_distance: f64,
    pub log_roughness: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub bars: usize,
    pub spot: Option<f64>,

    pub rv_20d: Option<f64>,
    pub hurst_price: Estimate<f64>,
    pub hurst_vol: Estimate<f64>,

    pub gex_profile: Estimate<Vec<GexEntry>>,
    pub net_gex: f64,

    pub vol: f64,
    pub skew: f64,
    pub fly: f64,
    pub term_structure: Vec<TermPoint>,
    /// Whether vol/skew/fly/term_structure are the no-options defaults.
    pub vol_surface_fallback: bool,

    pub manifold_point: Option<ManifoldPoint>,
    pub regimes: RegimeCalibration,
    pub regime: Option<RegimeAssessment>,

    pub roughness: Estimate<f64>,
    pub spline_samples: Vec<SplineSample>,
    pub geometry_vs_topology: Option<GeometryVsTopology>,

    pub signals: SignalComparison,

    pub chart: ChartStyle,
}

fn fmt_opt(v: Option<f64>, scale: f64, decimals: usize) -> String {
    match v {
        Some(x) => format!("{:.*}", decimals, x * scale),
        None => "n/a".to_string(),
    }
}

fn fallback_mark<T>(est: &Estimate<T>) -> &'static str {
    if est.is_fallback() { " (default)" } else { "" }
}

impl DiagnosticReport {
    /// Slack-flavoured text summary.
    pub fn summary(&self) -> String {
        let regime = match &self.regime {
            Some(a) => format!("{} (d={:.3})", a.regime, a.distance),
            None => "n/a".to_string(),
        };
        let lead = match self.signals.lead_time {
            Some(l) if l > 0 => format!("geometric led RSI by {} bars", l),
            Some(l) => format!("RSI led by {} bars", -l),
            None => "insufficient signals".to_string(),
        };
        let flag = if self.signals.geometric_led() { "🧭" } else { "📉" };

        format!(
            "📐 *Regime Diagnostics: {}*\n\
            > *Spot*: `{}` | *RV20*: `{}%`\n\
            > *Hurst*: price `{:.3}`{} / vol `{:.3}`{}\n\
            > *ATM Vol*: `{:.2}%` | *Skew*: `{:+.4}` | *Fly*: `{:+.4}`{}\n\
            > *Net GEX*: `{:+.4}M` over `{}` strikes\n\
            > *Regime*: {}\n\
            > *Roughness*: `{:.4}`{}\n\
            > {} *Signals*: {}",
            self.symbol,
            fmt_opt(self.spot, 1.0, 2),
            fmt_opt(self.rv_20d, 100.0, 2),
            self.hurst_price.value(), fallback_mark(&self.hurst_price),
            self.hurst_vol.value(), fallback_mark(&self.hurst_vol),
            self.vol * 100.0, self.skew, self.fly,
            if self.vol_surface_fallback { " (default)" } else { "" },
            self.net_gex, self.gex_profile.value().len(),
            regime,
            self.roughness.value(), fallback_mark(&self.roughness),
            flag, lead,
        )
    }
}
