// src/solvers/barrier_checks.rs
//! Conservative one-step barrier tests
//!
//! # Tiers
//!
//! 1. **Coarse**: every log-forward moves by at most
//!    ```text
//!    B = σmax² h N - ½ σmax² h + σmax √(hN)
//!    ```
//!    in one step. Since `S ≤ max_i L_i`, `max(x) + B < ln R` means the
//!    step cannot reach the barrier.
//! 2. **Fine**: componentwise worst case of the next state,
//!    ```text
//!    x̄_i = x_i + h σ_i σmax (i+1) - ½ σ_i² h + σ_i √h e_i
//!    ```
//!    with `e_i = Σ_j |U_ji|`. `S` is non-decreasing in every forward, so
//!    `S(x̄) < R` rules out a crossing.
//! 3. **Boundary zone**: neither bound clears the step.
//!
//! Both bounds dominate every `±1` shock realisation exactly.

use crate::models::correlation::CorrelationModel;
use crate::models::params::ModelParameters;
use crate::models::swap_rate::SwapRateFunction;
use crate::math_utils::max_element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarrierTier {
    CoarseSafe,
    FineSafe,
    BoundaryZone,
}

/// Step-independent pieces of both bounds
#[derive(Debug, Clone)]
pub struct StepBounds {
    coarse: f64,
    fine_drift: Vec<f64>,
    fine_diffusion: Vec<f64>,
    barrier: f64,
    log_barrier: f64,
}

impl StepBounds {
    pub fn new(params: &ModelParameters, correlation: &CorrelationModel) -> Self {
        let n = params.n_rates() as f64;
        let h = params.dt();
        let sigma_max = correlation.sigma_max();
        let coarse =
            sigma_max * sigma_max * h * n - 0.5 * sigma_max * sigma_max * h + sigma_max * (h * n).sqrt();

        let fine_drift = params
            .volatilities
            .iter()
            .enumerate()
            .map(|(i, &s)| h * s * sigma_max * (i + 1) as f64 - 0.5 * s * s * h)
            .collect();
        let fine_diffusion = params
            .volatilities
            .iter()
            .zip(correlation.shock_envelope())
            .map(|(&s, &e)| s * h.sqrt() * e)
            .collect();

        Self {
            coarse,
            fine_drift,
            fine_diffusion,
            barrier: params.barrier,
            log_barrier: params.barrier.ln(),
        }
    }

    /// Largest one-step move of any log-forward; also the boundary-zone scale λ
    pub fn coarse_bound(&self) -> f64 {
        self.coarse
    }

    pub fn coarse_safe(&self, x: &[f64]) -> bool {
        max_element(x) + self.coarse < self.log_barrier
    }

    /// Worst-case next state used by the fine check
    pub fn perturbed(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.fine_drift)
            .zip(&self.fine_diffusion)
            .map(|((&xi, &a), &b)| xi + a + b)
            .collect()
    }

    pub fn fine_safe(&self, swap: &SwapRateFunction, x: &[f64]) -> bool {
        swap.rate(&self.perturbed(x)) < self.barrier
    }

    pub fn classify(&self, swap: &SwapRateFunction, x: &[f64]) -> BarrierTier {
        if self.coarse_safe(x) {
            BarrierTier::CoarseSafe
        } else if self.fine_safe(swap, x) {
            BarrierTier::FineSafe
        } else {
            BarrierTier::BoundaryZone
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::lmm_step::{LmmStepper, ShockScheme};

    fn params(n: usize, barrier: f64) -> ModelParameters {
        ModelParameters {
            maturity: 2.0,
            steps: 4,
            barrier,
            initial_forwards: vec![0.05; n],
            volatilities: (0..n).map(|i| 0.15 + 0.05 * i as f64).collect(),
            beta: 0.2,
            ..Default::default()
        }
    }

    /// Every ±1 shock vector of length n
    fn sign_vectors(n: usize) -> impl Iterator<Item = Vec<f64>> {
        (0..1u32 << n).map(move |mask| {
            (0..n)
                .map(|j| if mask & (1 << j) != 0 { 1.0 } else { -1.0 })
                .collect()
        })
    }

    fn next_states(p: &ModelParameters, x: &[f64]) -> Vec<Vec<f64>> {
        let correlation = CorrelationModel::new(p).expect("valid correlation");
        let stepper = LmmStepper::new(p.tenor, p.dt(), p.volatilities.clone(), ShockScheme::Discrete);
        let n = x.len();
        let mut drift = vec![0.0; n];
        stepper.drift(&correlation, x, &mut drift);
        let sqrt_h = p.dt().sqrt();

        sign_vectors(n)
            .map(|xi| {
                let mut shocks = vec![0.0; n];
                correlation.correlate(&xi, &mut shocks);
                (0..n)
                    .map(|i| x[i] + drift[i] + p.volatilities[i] * sqrt_h * shocks[i])
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_coarse_bound_formula() {
        let p = params(4, 0.2);
        let correlation = CorrelationModel::new(&p).expect("valid correlation");
        let bounds = StepBounds::new(&p, &correlation);
        let (s, h, n): (f64, f64, f64) = (0.3, 0.5, 4.0);
        let expected = s * s * h * n - 0.5 * s * s * h + s * (h * n).sqrt();
        assert!((bounds.coarse_bound() - expected).abs() < 1e-14);
    }

    #[test]
    fn test_no_false_negatives_exhaustive() {
        // Whenever a tier declares the step safe, no ±1 shock may reach the barrier
        let n = 6;
        let swap = SwapRateFunction::new(1.0);
        for barrier in [0.06, 0.08, 0.1, 0.15, 0.3, 0.6] {
            let p = params(n, barrier);
            let correlation = CorrelationModel::new(&p).expect("valid correlation");
            let bounds = StepBounds::new(&p, &correlation);

            for level in [0.02, 0.04, 0.05, 0.055] {
                let x: Vec<f64> = (0..n).map(|i| (level * (1.0 + 0.05 * i as f64)).ln()).collect();
                let tier = bounds.classify(&swap, &x);
                if tier == BarrierTier::BoundaryZone {
                    continue;
                }
                for next in next_states(&p, &x) {
                    assert!(
                        swap.rate(&next) < barrier,
                        "{:?} at level {} let the swap rate reach {}",
                        tier,
                        level,
                        barrier
                    );
                    if tier == BarrierTier::CoarseSafe {
                        assert!(max_element(&next) < barrier.ln());
                    }
                }
            }
        }
    }

    #[test]
    fn test_tiers_tighten_towards_barrier() {
        let p = params(5, 0.075);
        let correlation = CorrelationModel::new(&p).expect("valid correlation");
        let bounds = StepBounds::new(&p, &correlation);
        let swap = SwapRateFunction::new(1.0);

        let far = vec![0.001f64.ln(); 5];
        assert_eq!(bounds.classify(&swap, &far), BarrierTier::CoarseSafe);

        let at = vec![0.075f64.ln(); 5];
        assert_eq!(bounds.classify(&swap, &at), BarrierTier::BoundaryZone);
    }

    #[test]
    fn test_fine_check_catches_what_coarse_misses() {
        // Tiny volatility: the coarse bound is loose compared with the fine one
        let p = ModelParameters {
            volatilities: vec![0.01; 5],
            ..params(5, 0.075)
        };
        let correlation = CorrelationModel::new(&p).expect("valid correlation");
        let bounds = StepBounds::new(&p, &correlation);
        let swap = SwapRateFunction::new(1.0);

        // One forward well above the barrier, the swap rate still well below
        let mut x = vec![0.05f64.ln(); 5];
        x[2] = 0.09f64.ln();
        assert!(!bounds.coarse_safe(&x));
        assert_eq!(bounds.classify(&swap, &x), BarrierTier::FineSafe);
    }
}
