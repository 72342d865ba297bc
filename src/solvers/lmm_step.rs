// src/solvers/lmm_step.rs
//! Log-Euler step of the LIBOR Market Model under the spot measure
//!
//! # Mathematical Framework
//!
//! In log-forward coordinates `x_i = ln L_i`:
//! ```text
//! dx_i = ( Σ_{j≤i} ρ_ij σ_i σ_j v_j - ½ σ_i² ) dt + σ_i dW_i,
//! v_j  = δ L_j / (1 + δ L_j)
//! ```
//! Discretised with step `h` and correlated shocks `Uᵀξ`:
//! ```text
//! x_{k+1} = x_k + h D v - ½ σ² h + σ ⊙ √h Uᵀξ
//! ```
//! # Shock schemes
//!
//! - **Discrete**: `ξ_j = ±1` with probability ½. Matches the first two
//!   moments of a standard normal and is bounded, so the tier bounds are exact.
//! - **Gaussian**: `ξ_j ~ N(0,1)`.

use crate::models::correlation::CorrelationModel;
use crate::rng;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShockScheme {
    /// Two-point ±1 draws
    #[default]
    Discrete,
    /// Standard normal draws
    Gaussian,
}

impl ShockScheme {
    /// Fill `out` with independent unit-variance shocks
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        match self {
            ShockScheme::Discrete => out.iter_mut().for_each(|v| *v = rng::get_sign_draw(rng)),
            ShockScheme::Gaussian => out.iter_mut().for_each(|v| *v = rng::get_normal_draw(rng)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShockScheme::Discrete => "discrete",
            ShockScheme::Gaussian => "gaussian",
        }
    }
}

/// Drift-and-diffusion stepper, shared read-only by every path
#[derive(Debug, Clone)]
pub struct LmmStepper {
    tenor: f64,
    dt: f64,
    sqrt_dt: f64,
    volatilities: Vec<f64>,
    scheme: ShockScheme,
}

impl LmmStepper {
    pub fn new(tenor: f64, dt: f64, volatilities: Vec<f64>, scheme: ShockScheme) -> Self {
        Self {
            tenor,
            dt,
            sqrt_dt: dt.sqrt(),
            volatilities,
            scheme,
        }
    }

    pub fn scheme(&self) -> ShockScheme {
        self.scheme
    }

    /// Spot-measure drift of every log-forward over one step
    pub fn drift(&self, correlation: &CorrelationModel, x: &[f64], out: &mut [f64]) {
        let d = correlation.drift_matrix();
        let v: Vec<f64> = x
            .iter()
            .map(|&xi| {
                let dl = self.tenor * xi.exp();
                dl / (1.0 + dl)
            })
            .collect();

        for (i, out_i) in out.iter_mut().enumerate() {
            let coupling: f64 = (0..=i).map(|j| d[(i, j)] * v[j]).sum();
            let sigma = self.volatilities[i];
            *out_i = self.dt * coupling - 0.5 * sigma * sigma * self.dt;
        }
    }

    /// Standard step: `x += drift + σ √h Uᵀξ`
    pub fn step<R: Rng + ?Sized>(
        &self,
        correlation: &CorrelationModel,
        x: &mut [f64],
        drift: &[f64],
        rng: &mut R,
    ) {
        let n = x.len();
        let mut xi = vec![0.0; n];
        let mut shocks = vec![0.0; n];
        self.scheme.draw(rng, &mut xi);
        correlation.correlate(&xi, &mut shocks);

        for i in 0..n {
            x[i] += drift[i] + self.volatilities[i] * self.sqrt_dt * shocks[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::params::ModelParameters;
    use crate::rng::RngFactory;
    use approx::assert_relative_eq;

    fn setup(n: usize, sigma: f64, steps: usize, scheme: ShockScheme) -> (LmmStepper, CorrelationModel) {
        let params = ModelParameters {
            maturity: steps as f64,
            steps,
            initial_forwards: vec![0.05; n],
            volatilities: vec![sigma; n],
            barrier: 1.0,
            ..Default::default()
        };
        let correlation = CorrelationModel::new(&params).expect("valid correlation");
        let stepper = LmmStepper::new(params.tenor, params.dt(), params.volatilities.clone(), scheme);
        (stepper, correlation)
    }

    #[test]
    fn test_sign_draws_are_unit() {
        let mut rng = RngFactory::new(7).path_rng(0);
        let mut out = [0.0; 64];
        ShockScheme::Discrete.draw(&mut rng, &mut out);
        assert!(out.iter().all(|&v| v == 1.0 || v == -1.0));
        assert!(out.iter().any(|&v| v == 1.0) && out.iter().any(|&v| v == -1.0));
    }

    #[test]
    fn test_drift_of_first_forward() {
        let (stepper, correlation) = setup(3, 0.2, 10, ShockScheme::Discrete);
        let x = vec![0.05f64.ln(); 3];
        let mut drift = vec![0.0; 3];
        stepper.drift(&correlation, &x, &mut drift);

        // Forward 0 couples only to itself
        let v = 0.05 / 1.05;
        assert_relative_eq!(drift[0], 0.04 * v - 0.5 * 0.04, epsilon = 1e-14);
        // Later forwards pick up more positive coupling
        assert!(drift[1] > drift[0] && drift[2] > drift[1]);
    }

    #[test]
    fn test_zero_volatility_step_is_deterministic() {
        let (stepper, correlation) = setup(4, 0.0, 10, ShockScheme::Gaussian);
        let mut x = vec![0.05f64.ln(); 4];
        let start = x.clone();
        let mut drift = vec![0.0; 4];
        stepper.drift(&correlation, &x, &mut drift);
        let mut rng = RngFactory::new(1).path_rng(3);
        stepper.step(&correlation, &mut x, &drift, &mut rng);
        for (a, b) in x.iter().zip(&start) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_shock_covariance_matches_model() {
        // Zero-drift increments must have covariance h σ_i σ_j ρ_ij
        let n = 5;
        let sigma = 0.2;
        let draws = 200_000;
        for scheme in [ShockScheme::Discrete, ShockScheme::Gaussian] {
            let (stepper, correlation) = setup(n, sigma, 1, scheme);
            let mut rng = RngFactory::new(2024).path_rng(0);
            let zero = vec![0.0; n];
            let mut sum = vec![vec![0.0; n]; n];

            for _ in 0..draws {
                let mut x = vec![0.0; n];
                stepper.step(&correlation, &mut x, &zero, &mut rng);
                for i in 0..n {
                    for j in 0..n {
                        sum[i][j] += x[i] * x[j];
                    }
                }
            }

            for i in 0..n {
                for j in 0..n {
                    let cov = sum[i][j] / draws as f64;
                    let expected = sigma * sigma * correlation.correlation()[(i, j)];
                    assert!(
                        (cov - expected).abs() < 1e-3,
                        "{:?} cov[{}][{}] = {} expected {}",
                        scheme,
                        i,
                        j,
                        cov,
                        expected
                    );
                }
            }
        }
    }
}
