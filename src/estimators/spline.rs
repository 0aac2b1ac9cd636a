//! Least-squares cubic B-spline fit and the roughness functional
//! `∫ f''(t)^2 dt` over [0, 1].

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::debug;

use crate::error::{Degradation, Estimate};
use crate::stats;

pub const DEGREE: usize = 3;
pub const MIN_POINTS: usize = 4;
const MIN_KNOTS: usize = 4;
const MAX_KNOTS: usize = 20;
const INTEGRATION_POINTS: usize = 1000;
const SVD_EPS: f64 = 1e-12;

/// Piecewise polynomial in B-spline form.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineModel {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
    degree: usize,
}

impl SplineModel {
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        if self.coefficients.is_empty() {
            return 0.0;
        }
        let span = find_span(&self.knots, self.degree, self.coefficients.len(), x);
        basis_functions(&self.knots, self.degree, span, x)
            .iter()
            .enumerate()
            .map(|(j, b)| b * self.coefficients[span - self.degree + j])
            .sum()
    }

    /// Derivative spline (degree - 1) on the inner knot vector.
    pub fn derivative(&self) -> SplineModel {
        if self.degree == 0 || self.coefficients.len() < 2 {
            return SplineModel { knots: self.knots.clone(), coefficients: vec![0.0; self.coefficients.len()], degree: self.degree };
        }
        let p = self.degree;
        let coefficients = self.coefficients
            .windows(2)
            .enumerate()
            .map(|(i, c)| {
                let span = self.knots[i + p + 1] - self.knots[i + 1];
                if span > 0.0 { p as f64 * (c[1] - c[0]) / span } else { 0.0 }
            })
            .collect();
        SplineModel {
            knots: self.knots[1..self.knots.len() - 1].to_vec(),
            coefficients,
            degree: p - 1,
        }
    }

    /// `n` uniform samples of the fitted curve on [0, 1].
    pub fn samples(&self, n: usize) -> Vec<SplineSample> {
        stats::linspace(0.0, 1.0, n)
            .into_iter()
            .map(|t| SplineSample { t, value: self.evaluate(t) })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplineSample {
    pub t: f64,
    pub value: f64,
}

/// Knot span index `s` with `knots[s] <= x < knots[s + 1]`,
/// clamped to the valid range so the right endpoint is included.
fn find_span(knots: &[f64], degree: usize, n_coef: usize, x: f64) -> usize {
    if x >= knots[n_coef] {
        return n_coef - 1;
    }
    if x <= knots[degree] {
        return degree;
    }
    let mut span = degree;
    while span + 1 < n_coef && knots[span + 1] <= x {
        span += 1;
    }
    span
}

/// Non-zero basis functions `N_{span-degree..=span}` at `x` (Cox-de Boor).
fn basis_functions(knots: &[f64], degree: usize, span: usize, x: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let den = right[r + 1] + left[j - r];
            let tmp = if den != 0.0 { n[r] / den } else { 0.0 };
            n[r] = saved + right[r + 1] * tmp;
            saved = left[j - r] * tmp;
        }
        n[j] = saved;
    }
    n
}

/// Clamped cubic knot vector for `n` samples:
/// `clamp(n / 2, 4, 20)` uniform positions on [0, 1], endpoints dropped
/// as interior knots, boundaries repeated `DEGREE + 1` times.
pub fn knot_vector(n: usize) -> Vec<f64> {
    let k = (n / 2).clamp(MIN_KNOTS, MAX_KNOTS);
    let interior = stats::linspace(0.0, 1.0, k);

    let mut knots = vec![0.0; DEGREE + 1];
    knots.extend_from_slice(&interior[1..k - 1]);
    knots.extend(std::iter::repeat_n(1.0, DEGREE + 1));
    knots
}

/// Least-squares cubic B-spline through `values` at uniform `t` on [0, 1].
pub fn fit_lsq_spline(values: &[f64]) -> Option<SplineModel> {
    let n = values.len();
    if n < MIN_POINTS || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let knots = knot_vector(n);
    let n_coef = knots.len() - DEGREE - 1;
    let ts = stats::linspace(0.0, 1.0, n);

    let mut design = DMatrix::zeros(n, n_coef);
    for (row, t) in ts.iter().enumerate() {
        let span = find_span(&knots, DEGREE, n_coef, *t);
        for (j, b) in basis_functions(&knots, DEGREE, span, *t).into_iter().enumerate() {
            design[(row, span - DEGREE + j)] = b;
        }
    }

    // SVD gives the minimum-norm solution when short paths leave the
    // system underdetermined.
    let rhs = DVector::from_column_slice(values);
    let coefficients = design.svd(true, true).solve(&rhs, SVD_EPS).ok()?;

    Some(SplineModel {
        knots,
        coefficients: coefficients.iter().copied().collect(),
        degree: DEGREE,
    })
}

/// `∫ f''(t)^2 dt` on [0, 1], trapezoid over 1000 uniform samples.
pub fn roughness(model: &SplineModel) -> f64 {
    let second = model.derivative().derivative();
    let ts = stats::linspace(0.0, 1.0, INTEGRATION_POINTS);
    let sq: Vec<f64> = ts.iter().map(|t| second.evaluate(*t).powi(2)).collect();
    stats::trapezoid(&ts, &sq)
}

#[derive(Debug, Clone, Serialize)]
pub struct RoughnessReport {
    pub roughness: Estimate<f64>,
    pub fitted: Vec<SplineSample>,
}

/// Fits `path` and measures its roughness. Fewer than four points (or a
/// failed fit) reports insufficient data with roughness 0 and no samples.
pub fn estimate_roughness(path: &[f64], sample_points: usize) -> RoughnessReport {
    match fit_lsq_spline(path) {
        Some(model) => RoughnessReport {
            roughness: Estimate::computed(roughness(&model)),
            fitted: model.samples(sample_points),
        },
        None => {
            debug!(len = path.len(), "spline: insufficient data, skipping fit");
            RoughnessReport {
                roughness: Estimate::fallback(0.0, Degradation::insufficient(MIN_POINTS, path.len())),
                fitted: Vec::new(),
            }
        }
    }
}
