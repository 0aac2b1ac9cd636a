//! Black-Scholes-Merton gamma and dealer Gamma Exposure (GEX) profile.
//!
//! Zero risk-free rate and zero dividend yield are assumed throughout.
//! These are screening greeks from quoted implied vols, not exchange-grade
//! sensitivities.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Degradation, Estimate};
use crate::models::{GexEntry, OptionChain, OptionQuote, OptionSide};
use crate::stats::round_to;

pub const DAYS_PER_YEAR: f64 = 365.0;
pub const CONTRACT_MULTIPLIER: f64 = 100.0;
/// Strikes further than this fraction from spot are dropped from the profile.
pub const STRIKE_WINDOW: f64 = 0.10;

/// Year fraction from a day count, floored at one day.
pub fn year_fraction(days_to_expiry: i64) -> f64 {
    days_to_expiry.max(1) as f64 / DAYS_PER_YEAR
}

/// BSM `d1` with r = q = 0. Zero when vol or time is non-positive.
pub fn d1(spot: f64, strike: f64, iv: f64, t: f64) -> f64 {
    if iv <= 0.0 || t <= 0.0 {
        return 0.0;
    }
    ((spot / strike).ln() + 0.5 * iv * iv * t) / (iv * t.sqrt())
}

/// BSM gamma `phi(d1) / (S * sigma * sqrt(T))`. Zero when ill-defined.
pub fn bsm_gamma(spot: f64, strike: f64, iv: f64, t: f64) -> f64 {
    if iv <= 0.0 || t <= 0.0 || spot <= 0.0 || strike <= 0.0 {
        return 0.0;
    }
    let d1 = d1(spot, strike, iv, t);
    (-0.5 * d1 * d1).exp() / (spot * iv * (2.0 * PI * t).sqrt())
}

/// Signed exposure of one quote in millions.
/// Dealers are assumed short calls (negative) and long puts (positive).
pub fn gex_contribution(quote: &OptionQuote, spot: f64, t: f64) -> f64 {
    let gamma = bsm_gamma(spot, quote.strike, quote.implied_vol, t);
    let exposure = quote.open_interest as f64 * gamma * spot * spot * CONTRACT_MULTIPLIER / 1e6;
    match quote.side {
        OptionSide::Call => -exposure,
        OptionSide::Put => exposure,
    }
}

/// Per-strike GEX over one expiry's chain.
///
/// Calls and puts at the same strike are summed. Only strikes within
/// 10% of spot survive, sorted ascending; strikes are rounded to 1 dp and
/// exposure to 4 dp. Unusable inputs yield an empty profile. When every
/// quote has a non-positive or non-finite implied vol the zero-gamma profile
/// is returned as an `IllDefinedGreek` fallback, not as a computed zero.
pub fn gex_profile(chain: &OptionChain, spot: f64, as_of: NaiveDate) -> Estimate<Vec<GexEntry>> {
    if !(spot.is_finite() && spot > 0.0) {
        return Estimate::fallback(Vec::new(), Degradation::upstream("no usable spot price"));
    }
    if chain.is_empty() {
        return Estimate::fallback(Vec::new(), Degradation::upstream("empty option chain"));
    }

    let t = year_fraction(chain.days_to_expiry(as_of));

    // Strikes keyed in integer cents to avoid float-key comparisons.
    let mut by_strike: BTreeMap<u64, f64> = BTreeMap::new();
    let mut skipped = 0usize;
    let mut ill_defined = 0usize;
    let mut priced = 0usize;
    for quote in chain.quotes() {
        if !(quote.strike.is_finite() && quote.strike > 0.0) {
            skipped += 1;
            continue;
        }
        if quote.implied_vol.is_finite() && quote.implied_vol > 0.0 {
            priced += 1;
        } else {
            ill_defined += 1;
        }
        let key = (quote.strike * 100.0).round() as u64;
        *by_strike.entry(key).or_insert(0.0) += gex_contribution(quote, spot, t);
    }
    if skipped > 0 || ill_defined > 0 {
        debug!(skipped, ill_defined, expiry = %chain.expiry, "gex: quotes without a usable gamma");
    }

    let profile: Vec<GexEntry> = by_strike
        .into_iter()
        .map(|(key, gex)| (key as f64 / 100.0, gex))
        .filter(|(strike, _)| ((strike - spot) / spot).abs() < STRIKE_WINDOW)
        .map(|(strike, gex)| GexEntry { strike: round_to(strike, 1), gex: round_to(gex, 4) })
        .collect();

    if priced == 0 {
        let detail = format!("{} of {} quotes have no positive implied vol", ill_defined, ill_defined + skipped);
        return Estimate::fallback(profile, Degradation::ill_defined_greek(detail));
    }
    Estimate::computed(profile)
}

/// Net exposure across a profile.
pub fn net_gex(profile: &[GexEntry]) -> f64 {
    profile.iter().map(|e| e.gex).sum()
}
