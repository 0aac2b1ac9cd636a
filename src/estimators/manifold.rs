//! Fisher information geometry of Gaussian (drift, variance) pairs.
//!
//! Each log-return path maps to a point `(mu, sigma2)` on the manifold of
//! the Gaussian location-scale family. Distances use the Rao geodesic
//! metric; regime centroids use an approximate Fréchet mean.

use serde::{Deserialize, Serialize};

use crate::stats;

/// Lower bound for `sigma2`; the geodesic divides by `sqrt(sigma2)`.
pub const SIGMA2_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManifoldPoint {
    pub mu: f64,
    pub sigma2: f64,
}

impl ManifoldPoint {
    /// Builds a point, flooring the variance.
    pub fn new(mu: f64, sigma2: f64) -> Self {
        Self { mu, sigma2: sigma2.max(SIGMA2_FLOOR) }
    }

    /// Annualized drift and variance of a log-return path sampled every `dt` years.
    pub fn from_log_returns(returns: &[f64], dt: f64) -> Option<Self> {
        if dt <= 0.0 {
            return None;
        }
        let mu = stats::mean(returns)? / dt;
        let sigma2 = stats::population_variance(returns)? / dt;
        Some(Self::new(mu, sigma2))
    }
}

/// Rao geodesic distance
/// `sqrt(2 * ln(s2/s1)^2 + (mu2 - mu1)^2 / (s1 * s2))` with `s = sqrt(sigma2)`.
pub fn geodesic_distance(p1: &ManifoldPoint, p2: &ManifoldPoint) -> f64 {
    let s1 = p1.sigma2.max(SIGMA2_FLOOR).sqrt();
    let s2 = p2.sigma2.max(SIGMA2_FLOOR).sqrt();
    let ln_ratio = (s2 / s1).ln().abs();
    let mu_term = (p2.mu - p1.mu).powi(2) / (s1 * s2);
    (2.0 * ln_ratio * ln_ratio + mu_term).sqrt()
}

/// Pairwise geodesic distances, `n x n`.
pub fn distance_matrix(points: &[ManifoldPoint]) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|a| points.iter().map(|b| geodesic_distance(a, b)).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrechetConfig {
    pub max_iter: usize,
    pub lr: f64,
    pub tol: f64,
}

impl Default for FrechetConfig {
    fn default() -> Self {
        Self { max_iter: 100, lr: 0.1, tol: 1e-6 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrechetResult {
    pub centroid: ManifoldPoint,
    pub iterations: usize,
    pub converged: bool,
}

/// Approximate Riemannian (Fréchet) mean.
///
/// This is NOT the Karcher mean: steps follow Euclidean residuals
/// `mean(points - centroid)` instead of tangent-space logarithms, starting
/// from the arithmetic mean. Treat centroids as a proxy; whether the true
/// geodesic mean is needed for production accuracy is an open question.
pub fn frechet_mean(points: &[ManifoldPoint], cfg: &FrechetConfig) -> Option<FrechetResult> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let mut mu_c = points.iter().map(|p| p.mu).sum::<f64>() / n;
    let mut s2_c = (points.iter().map(|p| p.sigma2).sum::<f64>() / n).max(SIGMA2_FLOOR);

    for iter in 0..cfg.max_iter {
        let d_mu = points.iter().map(|p| p.mu - mu_c).sum::<f64>() / n;
        let d_s2 = points.iter().map(|p| p.sigma2 - s2_c).sum::<f64>() / n;
        if d_mu.abs() < cfg.tol && d_s2.abs() < cfg.tol {
            return Some(FrechetResult {
                centroid: ManifoldPoint { mu: mu_c, sigma2: s2_c },
                iterations: iter,
                converged: true,
            });
        }
        mu_c += cfg.lr * d_mu;
        s2_c = (s2_c + cfg.lr * d_s2).max(SIGMA2_FLOOR);
    }

    Some(FrechetResult {
        centroid: ManifoldPoint { mu: mu_c, sigma2: s2_c },
        iterations: cfg.max_iter,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_to_self_is_zero() {
        let p = ManifoldPoint::new(0.12, 0.04);
        assert_eq!(geodesic_distance(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let p = ManifoldPoint::new(0.15, 0.0225);
        let q = ManifoldPoint::new(-0.5, 0.36);
        assert_relative_eq!(geodesic_distance(&p, &q), geodesic_distance(&q, &p), epsilon = 1e-12);
    }

    #[test]
    fn pure_scale_change_is_sqrt2_log_ratio() {
        let p = ManifoldPoint::new(0.0, 0.01);
        let q = ManifoldPoint::new(0.0, 0.04);
        assert_relative_eq!(geodesic_distance(&p, &q), 2f64.sqrt() * 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn variance_is_floored() {
        let p = ManifoldPoint::new(0.0, 0.0);
        assert_eq!(p.sigma2, SIGMA2_FLOOR);
        assert!(geodesic_distance(&p, &ManifoldPoint::new(1.0, 1.0)).is_finite());
    }

    #[test]
    fn identical_points_converge_immediately() {
        let p = ManifoldPoint::new(0.07, 0.09);
        let res = frechet_mean(&[p; 12], &FrechetConfig::default()).unwrap();
        assert!(res.converged);
        assert!(res.iterations <= 1);
        assert_relative_eq!(res.centroid.mu, p.mu, epsilon = 1e-12);
        assert_relative_eq!(res.centroid.sigma2, p.sigma2, epsilon = 1e-12);
    }

    #[test]
    fn centroid_of_spread_points_is_their_mean() {
        let pts = [ManifoldPoint::new(-0.2, 0.01), ManifoldPoint::new(0.4, 0.05)];
        let res = frechet_mean(&pts, &FrechetConfig::default()).unwrap();
        assert_relative_eq!(res.centroid.mu, 0.1, epsilon = 1e-9);
        assert_relative_eq!(res.centroid.sigma2, 0.03, epsilon = 1e-9);
    }

    #[test]
    fn centroid_variance_is_floored() {
        let pts = [
            ManifoldPoint { mu: 0.05, sigma2: 0.0 },
            ManifoldPoint { mu: 0.05, sigma2: 1e-9 },
            ManifoldPoint { mu: 0.05, sigma2: -1e-8 },
        ];
        let res = frechet_mean(&pts, &FrechetConfig::default()).unwrap();
        assert_eq!(res.centroid.sigma2, SIGMA2_FLOOR);
        assert_relative_eq!(res.centroid.mu, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn zero_iterations_report_not_converged() {
        let pts = [ManifoldPoint::new(-0.2, 0.01), ManifoldPoint::new(0.4, 0.05)];
        let cfg = FrechetConfig { max_iter: 0, ..FrechetConfig::default() };
        let res = frechet_mean(&pts, &cfg).unwrap();
        assert!(!res.converged);
        assert_eq!(res.iterations, 0);
        assert_relative_eq!(res.centroid.mu, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn unreachable_tolerance_runs_out_of_iterations() {
        let pts = [ManifoldPoint::new(-0.2, 0.01), ManifoldPoint::new(0.4, 0.05)];
        let cfg = FrechetConfig { max_iter: 7, tol: 0.0, ..FrechetConfig::default() };
        let res = frechet_mean(&pts, &cfg).unwrap();
        assert!(!res.converged);
        assert_eq!(res.iterations, 7);
    }

    #[test]
    fn empty_set_has_no_mean() {
        assert!(frechet_mean(&[], &FrechetConfig::default()).is_none());
    }

    #[test]
    fn from_returns_annualizes() {
        let r = [0.01, -0.01, 0.01, -0.01];
        let p = ManifoldPoint::from_log_returns(&r, 0.01).unwrap();
        assert_relative_eq!(p.mu, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.sigma2, 0.0001 / 0.01, epsilon = 1e-12);
    }

    #[test]
    fn matrix_has_zero_diagonal() {
        let pts = [ManifoldPoint::new(0.1, 0.02), ManifoldPoint::new(0.0, 0.1), ManifoldPoint::new(-0.3, 0.3)];
        let m = distance_matrix(&pts);
        assert_eq!(m.len(), 3);
        for i in 0..3 {
            assert_eq!(m[i][i], 0.0);
            for j in 0..3 {
                assert_relative_eq!(m[i][j], m[j][i], epsilon = 1e-12);
            }
        }
    }
}
