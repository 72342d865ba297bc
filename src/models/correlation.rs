// src/models/correlation.rs
//! Forward-rate correlation for the LIBOR Market Model
//!
//! # Mathematical Framework
//!
//! Forwards are anchored at `t_i = iδ + T0 - Nδ` and correlated by
//! exponential decay:
//! ```text
//! ρ_ij = exp(-β |t_i - t_j|)
//! ```
//! The factor `U` is upper triangular with `ρ = UᵀU`, so a vector `ξ` of
//! uncorrelated unit shocks is correlated as `Uᵀξ`:
//! ```text
//! Cov(Uᵀξ) = Uᵀ Cov(ξ) U = UᵀU = ρ
//! ```
//! The drift-coupling matrix keeps the lower triangle of `ρ ⊙ (σ ⊗ σ)`,
//! which is all the spot-LIBOR drift of forward `i` needs (`j ≤ i`).

use super::params::ModelParameters;
use crate::error::{LmmError, LmmResult};
use nalgebra::DMatrix;

const PIVOT_FLOOR: f64 = 1e-10;

/// Correlation, Cholesky factor and drift coupling, built once per run
#[derive(Debug, Clone)]
pub struct CorrelationModel {
    correlation: DMatrix<f64>,
    factor: DMatrix<f64>,
    drift: DMatrix<f64>,
    shock_envelope: Vec<f64>,
    sigma_max: f64,
}

impl CorrelationModel {
    pub fn new(params: &ModelParameters) -> LmmResult<Self> {
        let n = params.n_rates();
        let anchors: Vec<f64> = (0..n)
            .map(|i| i as f64 * params.tenor + params.maturity - n as f64 * params.tenor)
            .collect();

        let correlation =
            DMatrix::from_fn(n, n, |i, j| (-params.beta * (anchors[i] - anchors[j]).abs()).exp());

        // A zero or non-finite pivot means ρ is singular even if the factorisation returned
        let factor = correlation
            .clone()
            .cholesky()
            .map(|c| c.l())
            .filter(|l| (0..n).all(|i| l[(i, i)].is_finite() && l[(i, i)] > PIVOT_FLOOR))
            .ok_or_else(|| LmmError::NumericalInstability {
                method: "Cholesky decomposition".to_string(),
                reason: format!(
                    "correlation matrix (β = {}, δ = {}, N = {}) is not positive definite",
                    params.beta, params.tenor, n
                ),
            })?
            .transpose();

        let sigma = &params.volatilities;
        let drift = DMatrix::from_fn(n, n, |i, j| {
            if i >= j {
                correlation[(i, j)] * sigma[i] * sigma[j]
            } else {
                0.0
            }
        });

        // ℓ¹ norm of row i of Uᵀ: the largest |(Uᵀξ)_i| over ξ ∈ {±1}ᴺ
        let shock_envelope = (0..n)
            .map(|i| (0..=i).map(|j| factor[(j, i)].abs()).sum())
            .collect();

        Ok(CorrelationModel {
            correlation,
            factor,
            drift,
            shock_envelope,
            sigma_max: params.sigma_max(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.correlation.nrows()
    }

    /// Correlation matrix ρ
    pub fn correlation(&self) -> &DMatrix<f64> {
        &self.correlation
    }

    /// Upper triangular factor U with ρ = UᵀU
    pub fn factor(&self) -> &DMatrix<f64> {
        &self.factor
    }

    /// Lower triangle of ρ ⊙ (σ ⊗ σ)
    pub fn drift_matrix(&self) -> &DMatrix<f64> {
        &self.drift
    }

    pub fn shock_envelope(&self) -> &[f64] {
        &self.shock_envelope
    }

    pub fn sigma_max(&self) -> f64 {
        self.sigma_max
    }

    /// Writes `Uᵀξ` into `out`
    pub fn correlate(&self, xi: &[f64], out: &mut [f64]) {
        let n = self.dimension();
        for i in 0..n {
            let mut v = 0.0;
            for j in 0..=i {
                v += self.factor[(j, i)] * xi[j];
            }
            out[i] = v;
        }
    }
}
