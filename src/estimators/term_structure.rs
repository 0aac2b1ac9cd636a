//! ATM implied vol, skew and fly across the nearest expiries.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Degradation, Estimate};
use crate::models::{OptionChain, OptionQuote, TermPoint};
use crate::stats;

pub const DEFAULT_VOL: f64 = 0.30;
pub const DEFAULT_SKEW: f64 = -0.04;
pub const DEFAULT_FLY: f64 = 0.015;
pub const MAX_EXPIRIES: usize = 5;

const OTM_PUT_MONEYNESS: f64 = 0.95;
const OTM_CALL_MONEYNESS: f64 = 1.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolSurfaceSummary {
    pub vol: f64,
    pub skew: f64,
    pub fly: f64,
    pub term_structure: Vec<TermPoint>,
}

impl Default for VolSurfaceSummary {
    fn default() -> Self {
        Self {
            vol: DEFAULT_VOL,
            skew: DEFAULT_SKEW,
            fly: DEFAULT_FLY,
            term_structure: Vec::new(),
        }
    }
}

/// Call whose strike is nearest to spot.
fn atm_call(chain: &OptionChain, spot: f64) -> Option<&OptionQuote> {
    chain.calls
        .iter()
        .filter(|q| q.strike.is_finite())
        .min_by(|a, b| (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs()))
}

fn mean_iv<'a>(quotes: impl Iterator<Item = &'a OptionQuote>) -> Option<f64> {
    let ivs: Vec<f64> = quotes.map(|q| q.implied_vol).collect();
    stats::mean(&ivs)
}

/// Builds the term structure from up to `max_expiries` chains.
///
/// Skew and fly come from the nearest expiry only and keep their defaults
/// when the needed OTM wings are missing. With no usable chain the whole
/// summary falls back to vol 0.30, skew -0.04, fly 0.015.
pub fn build_term_structure(
    chains: &[OptionChain],
    spot: f64,
    as_of: NaiveDate,
    max_expiries: usize,
) -> Estimate<VolSurfaceSummary> {
    if !(spot.is_finite() && spot > 0.0) {
        return Estimate::fallback(VolSurfaceSummary::default(), Degradation::upstream("no usable spot price"));
    }

    let mut sorted: Vec<&OptionChain> = chains.iter().filter(|c| !c.is_empty()).collect();
    sorted.sort_by_key(|c| c.expiry);
    sorted.truncate(max_expiries);

    let Some(nearest) = sorted.first().copied() else {
        return Estimate::fallback(VolSurfaceSummary::default(), Degradation::upstream("no option chains"));
    };

    let mut summary = VolSurfaceSummary::default();
    for chain in &sorted {
        if let Some(atm) = atm_call(chain, spot) {
            summary.term_structure.push(TermPoint {
                days: chain.days_to_expiry(as_of),
                iv: atm.implied_vol,
            });
        }
    }

    let Some(atm) = atm_call(nearest, spot) else {
        return Estimate::fallback(
            summary,
            Degradation::MissingMarketField { field: "atm call".into() },
        );
    };
    let atm_iv = atm.implied_vol;
    summary.vol = atm_iv;

    let otm_puts = mean_iv(nearest.puts.iter().filter(|q| q.strike < OTM_PUT_MONEYNESS * spot));
    let otm_calls = mean_iv(nearest.calls.iter().filter(|q| q.strike > OTM_CALL_MONEYNESS * spot));

    if let Some(put_iv) = otm_puts {
        summary.skew = put_iv - atm_iv;
    }
    if let (Some(put_iv), Some(call_iv)) = (otm_puts, otm_calls) {
        summary.fly = (put_iv + call_iv) / 2.0 - atm_iv;
    }

    Estimate::computed(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionSide;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chain(expiry: NaiveDate, rows: &[(f64, OptionSide, f64)]) -> OptionChain {
        let mut c = OptionChain::new(expiry);
        for (strike, side, iv) in rows {
            c.push(OptionQuote { strike: *strike, open_interest: 10, implied_vol: *iv, expiry, side: *side });
        }
        c
    }

    #[test]
    fn defaults_without_chains() {
        let est = build_term_structure(&[], 100.0, date(2026, 1, 1), MAX_EXPIRIES);
        assert!(est.is_fallback());
        let s = est.into_value();
        assert_eq!(s.vol, 0.30);
        assert_eq!(s.skew, -0.04);
        assert_eq!(s.fly, 0.015);
        assert!(s.term_structure.is_empty());
    }

    #[test]
    fn atm_skew_and_fly_from_nearest_expiry() {
        use OptionSide::*;
        let as_of = date(2026, 1, 1);
        let near = chain(date(2026, 1, 16), &[
            (90.0, Put, 0.40),
            (92.0, Put, 0.36),
            (99.0, Call, 0.25),
            (101.5, Call, 0.27),
            (110.0, Call, 0.28),
        ]);
        let far = chain(date(2026, 3, 2), &[(100.0, Call, 0.31)]);

        // Out of order on purpose: the builder sorts by expiry.
        let s = build_term_structure(&[far, near], 100.0, as_of, MAX_EXPIRIES).into_value();
        assert_relative_eq!(s.vol, 0.25);
        assert_relative_eq!(s.skew, 0.38 - 0.25, epsilon = 1e-12);
        assert_relative_eq!(s.fly, (0.38 + 0.28) / 2.0 - 0.25, epsilon = 1e-12);
        assert_eq!(s.term_structure, vec![
            TermPoint { days: 15, iv: 0.25 },
            TermPoint { days: 60, iv: 0.31 },
        ]);
    }

    #[test]
    fn fly_keeps_default_without_otm_calls() {
        use OptionSide::*;
        let near = chain(date(2026, 1, 2), &[(90.0, Put, 0.40), (100.0, Call, 0.30)]);
        let s = build_term_structure(&[near], 100.0, date(2026, 1, 2), MAX_EXPIRIES).into_value();
        assert_eq!(s.fly, DEFAULT_FLY);
        assert_relative_eq!(s.skew, 0.10, epsilon = 1e-12);
        assert_eq!(s.term_structure[0].days, 1);
    }

    #[test]
    fn only_nearest_expiries_are_used() {
        use OptionSide::*;
        let as_of = date(2026, 1, 1);
        let chains: Vec<OptionChain> = (1..=7)
            .map(|m| chain(date(2026, m + 1, 1), &[(100.0, Call, 0.2 + m as f64 / 100.0)]))
            .collect();
        let s = build_term_structure(&chains, 100.0, as_of, MAX_EXPIRIES).into_value();
        assert_eq!(s.term_structure.len(), 5);
    }
}
