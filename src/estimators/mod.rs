//! Numerical estimators
//!
//! Pure functions of a series or an option table:
//! - `hurst`: rescaled-range Hurst exponent
//! - `gex`: BSM gamma and per-strike gamma exposure
//! - `term_structure`: ATM vol, skew, fly, term structure
//! - `manifold`: Rao geodesic distance and Fréchet mean
//! - `spline`: least-squares B-spline roughness

pub mod hurst;
pub mod gex;
pub mod term_structure;
pub mod manifold;
pub mod spline;
