//! Regime calibration on the Fisher manifold.
//!
//! Synthetic GBM paths per regime are projected to `(mu, sigma2)` points,
//! each regime gets a Fréchet centroid, and the observed market point is
//! assigned to the geodesically nearest centroid.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegimeConfig;
use crate::estimators::manifold::{self, FrechetConfig, ManifoldPoint};

const START_PRICE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSpec {
    pub name: String,
    pub drift: f64,
    pub vol: f64,
}

impl RegimeSpec {
    pub fn new(name: impl Into<String>, drift: f64, vol: f64) -> Self {
        Self { name: name.into(), drift, vol }
    }
}

pub fn default_regimes() -> Vec<RegimeSpec> {
    vec![
        RegimeSpec::new("Bull Market", 0.15, 0.15),
        RegimeSpec::new("Bear Crash", -0.50, 0.60),
        RegimeSpec::new("High Vol Chop", 0.00, 0.40),
        RegimeSpec::new("Low Vol Creep", 0.05, 0.08),
    ]
}

/// GBM price paths for one regime, each reduced to a manifold point.
pub fn simulate_regime_points(
    spec: &RegimeSpec,
    num_paths: usize,
    steps: usize,
    dt: f64,
    rng: &mut StdRng,
) -> Vec<ManifoldPoint> {
    let drift_step = (spec.drift - 0.5 * spec.vol * spec.vol) * dt;
    let shock_scale = spec.vol * dt.sqrt();

    (0..num_paths)
        .filter_map(|_| {
            let mut prices = Vec::with_capacity(steps);
            prices.push(START_PRICE);
            for _ in 1..steps {
                let eps: f64 = StandardNormal.sample(&mut *rng);
                let last = prices[prices.len() - 1];
                prices.push(last * (drift_step + shock_scale * eps).exp());
            }
            let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
            ManifoldPoint::from_log_returns(&returns, dt)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeCentroid {
    pub name: String,
    pub centroid: ManifoldPoint,
    pub samples: usize,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeCalibration {
    pub centroids: Vec<RegimeCentroid>,
    /// Geodesic distances between centroids, rows/cols in `centroids` order.
    pub distance_matrix: Vec<Vec<f64>>,
}

impl RegimeCalibration {
    /// Nearest centroid to `point` by geodesic distance.
    pub fn classify(&self, point: &ManifoldPoint) -> Option<RegimeAssessment> {
        let distances: Vec<(String, f64)> = self.centroids
            .iter()
            .map(|c| (c.name.clone(), manifold::geodesic_distance(point, &c.centroid)))
            .collect();

        let (regime, distance) = distances
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .cloned()?;

        Some(RegimeAssessment { regime, distance, distances })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeAssessment {
    pub regime: String,
    pub distance: f64,
    pub distances: Vec<(String, f64)>,
}

/// Centroids from caller-provided point clouds, one per named regime.
pub fn centroids_from_points(
    clouds: &[(String, Vec<ManifoldPoint>)],
    frechet: &FrechetConfig,
) -> RegimeCalibration {
    let centroids: Vec<RegimeCentroid> = clouds
        .iter()
        .filter_map(|(name, points)| {
            let res = manifold::frechet_mean(points, frechet)?;
            debug!(
                regime = %name,
                mu = format!("{:+.3}", res.centroid.mu),
                sigma2 = format!("{:.4}", res.centroid.sigma2),
                iterations = res.iterations,
                "regime centroid"
            );
            Some(RegimeCentroid {
                name: name.clone(),
                centroid: res.centroid,
                samples: points.len(),
                iterations: res.iterations,
                converged: res.converged,
            })
        })
        .collect();

    let points: Vec<ManifoldPoint> = centroids.iter().map(|c| c.centroid).collect();
    RegimeCalibration {
        distance_matrix: manifold::distance_matrix(&points),
        centroids,
    }
}

/// Simulates every configured regime and calibrates its centroid.
/// Deterministic for a given seed.
pub fn calibrate(cfg: &RegimeConfig) -> RegimeCalibration {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let clouds: Vec<(String, Vec<ManifoldPoint>)> = cfg.regimes
        .iter()
        .map(|spec| {
            let pts = simulate_regime_points(spec, cfg.num_paths, cfg.steps, cfg.dt, &mut rng);
            (spec.name.clone(), pts)
        })
        .collect();
    centroids_from_points(&clouds, &cfg.frechet)
}
