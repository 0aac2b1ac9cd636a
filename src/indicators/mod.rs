//! Trailing indicators over bar closes
//!
//! - `base`: shared buffers and the `TrailingIndicator` trait
//! - `vol`: realized volatility (RMS of log-returns, annualized)
//! - `rsi`: classical relative strength index
//! - `exhaustion`: geometric exhaustion signal (momentum up, vol down)

pub mod base;
pub mod vol;
pub mod rsi;
pub mod exhaustion;
