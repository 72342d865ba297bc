// src/solvers/projection.rs
//! Closest point on the barrier manifold
//!
//! # Mathematical Framework
//!
//! The barrier manifold in log-forward space is
//! ```text
//! M = { z ∈ ℝᴺ : S(z) = R }
//! ```
//! and the projector returns a local minimiser of `‖z - x‖₂` over `M`.
//!
//! ## Reduced form (default)
//!
//! With `c_i = ∏_{1≤j≤i} 1/(1 + δL_j)`, `c_0 = 1` and `C = Σ_i c_i`, the
//! barrier condition is linear in `L_0`:
//! ```text
//! S = (1 + δL_0 - c_{N-1}) / (δ C) = R   ⇔   L_0 = R C + (c_{N-1} - 1) / δ
//! ```
//! so `z_0` is eliminated and BFGS minimises the remaining distance over
//! `z_1..z_{N-1}` with an analytic gradient:
//! ```text
//! ∂L_0/∂z_k = -v_k (R Σ_{i≥k} c_i + c_{N-1}/δ),   v_k = δL_k / (1 + δL_k)
//! ```
//!
//! ## Constrained form
//!
//! SQP on `ln S(z) = ln R` (see [`crate::solvers::constrained`]).

use crate::math_utils::euclidean_distance;
use crate::models::swap_rate::SwapRateFunction;
use crate::solvers::bfgs::{self, BfgsError, BfgsOptions};
use crate::solvers::constrained::{self, ConstrainedError, ConstrainedOptions};
use nalgebra::DVector;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMethod {
    /// Leading coordinate eliminated in closed form, BFGS on the rest
    #[default]
    Reduced,
    /// Equality-constrained least squares on the full vector
    Constrained,
}

impl ProjectionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ProjectionMethod::Reduced => "reduced",
            ProjectionMethod::Constrained => "constrained",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionOptions {
    pub max_iterations: usize,
    pub gradient_tolerance: f64, // BFGS stopping rule (reduced form)
    pub step_tolerance: f64,     // SQP stopping rule (constrained form)
    pub barrier_tolerance: f64,  // Required |S(x*) - R|
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gradient_tolerance: 1e-10,
            step_tolerance: 1e-12,
            barrier_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("{method} projection did not converge after {iterations} iterations (residual {residual:.3e})")]
    DidNotConverge {
        method: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("{method} projection has no feasible starting point: eliminated forward would be {value:.3e}")]
    InfeasibleStart { method: &'static str, value: f64 },

    #[error("{method} projection missed the barrier: |S(x*) - R| = {gap:.3e}")]
    OffBarrier { method: &'static str, gap: f64 },
}

/// Closest point of the barrier manifold together with its distance
#[derive(Debug, Clone)]
pub struct Projection {
    pub point: Vec<f64>,
    pub distance: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct BarrierProjector {
    swap: SwapRateFunction,
    barrier: f64,
    method: ProjectionMethod,
    options: ProjectionOptions,
}

impl BarrierProjector {
    pub fn new(
        swap: SwapRateFunction,
        barrier: f64,
        method: ProjectionMethod,
        options: ProjectionOptions,
    ) -> Self {
        Self {
            swap,
            barrier,
            method,
            options,
        }
    }

    pub fn method(&self) -> ProjectionMethod {
        self.method
    }

    pub fn barrier(&self) -> f64 {
        self.barrier
    }

    /// Project the log-forward curve `x` onto `{z : S(z) = R}`
    pub fn project(&self, x: &[f64]) -> Result<Projection, ProjectionError> {
        let (point, iterations) = match self.method {
            ProjectionMethod::Reduced => self.project_reduced(x)?,
            ProjectionMethod::Constrained => self.project_constrained(x)?,
        };

        let gap = (self.swap.rate(&point) - self.barrier).abs();
        if !(gap < self.options.barrier_tolerance) {
            return Err(ProjectionError::OffBarrier {
                method: self.method.name(),
                gap,
            });
        }

        Ok(Projection {
            distance: euclidean_distance(x, &point),
            point,
            iterations,
        })
    }

    /// Log of the leading forward that puts the curve `(z_0, tail)` on the barrier
    ///
    /// Returns `None` when no positive `L_0` reaches the barrier.
    pub fn leading_log_forward(&self, tail: &[f64]) -> Option<f64> {
        let l0 = self.leading_forward(tail);
        (l0 > 0.0 && l0.is_finite()).then(|| l0.ln())
    }

    fn project_reduced(&self, x: &[f64]) -> Result<(Vec<f64>, usize), ProjectionError> {
        let method = self.method.name();
        if x.len() == 1 {
            return Ok((vec![self.barrier.ln()], 0));
        }

        let options = BfgsOptions {
            max_iterations: self.options.max_iterations,
            gradient_tolerance: self.options.gradient_tolerance,
            ..Default::default()
        };
        let start = DVector::from_column_slice(&x[1..]);
        let outcome = bfgs::minimize(start, &options, |y| self.reduced_objective(x, y))
            .map_err(|e| match e {
                BfgsError::NonFiniteStart => ProjectionError::InfeasibleStart {
                    method,
                    value: self.leading_forward(&x[1..]),
                },
                BfgsError::MaxIterations {
                    iterations,
                    gradient_norm,
                } => ProjectionError::DidNotConverge {
                    method,
                    iterations,
                    residual: gradient_norm,
                },
                BfgsError::LineSearch {
                    iteration,
                    gradient_norm,
                } => ProjectionError::DidNotConverge {
                    method,
                    iterations: iteration,
                    residual: gradient_norm,
                },
            })?;

        let tail = outcome.x.as_slice();
        let z0 = self
            .leading_log_forward(tail)
            .ok_or(ProjectionError::InfeasibleStart {
                method,
                value: self.leading_forward(tail),
            })?;

        let mut point = Vec::with_capacity(x.len());
        point.push(z0);
        point.extend_from_slice(tail);
        Ok((point, outcome.iterations))
    }

    /// `L_0 = R C + (c_{N-1} - 1) / δ`
    fn leading_forward(&self, tail: &[f64]) -> f64 {
        let delta = self.swap.tenor;
        let mut c = 1.0;
        let mut total = 1.0;
        for &z in tail {
            c /= 1.0 + delta * z.exp();
            total += c;
        }
        self.barrier * total + (c - 1.0) / delta
    }

    /// Squared distance with `z_0` eliminated, and its gradient in `z_1..z_{N-1}`
    fn reduced_objective(&self, x: &[f64], y: &DVector<f64>) -> (f64, DVector<f64>) {
        let delta = self.swap.tenor;
        let r = self.barrier;
        let m = y.len();

        let mut c = Vec::with_capacity(m + 1);
        let mut v = Vec::with_capacity(m);
        c.push(1.0);
        for k in 0..m {
            let dl = delta * y[k].exp();
            v.push(dl / (1.0 + dl));
            c.push(c[k] / (1.0 + dl));
        }
        let total: f64 = c.iter().sum();
        let last = c[m];

        let l0 = r * total + (last - 1.0) / delta;
        if !(l0 > 0.0) || !l0.is_finite() {
            return (f64::INFINITY, DVector::zeros(m));
        }
        let lead = l0.ln() - x[0];

        let mut value = lead * lead;
        let mut gradient = DVector::zeros(m);
        let mut tail = 0.0;
        for k in (1..=m).rev() {
            tail += c[k];
            let dl0 = -v[k - 1] * (r * tail + last / delta);
            let diff = y[k - 1] - x[k];
            value += diff * diff;
            gradient[k - 1] = 2.0 * lead * dl0 / l0 + 2.0 * diff;
        }
        (value, gradient)
    }

    fn project_constrained(&self, x: &[f64]) -> Result<(Vec<f64>, usize), ProjectionError> {
        let method = self.method.name();
        let options = ConstrainedOptions {
            max_iterations: self.options.max_iterations,
            step_tolerance: self.options.step_tolerance,
            ..Default::default()
        };
        let log_barrier = self.barrier.ln();
        let start = DVector::from_column_slice(x);

        let outcome = constrained::project_onto_level_set(&start, &options, |z| {
            let zs = z.as_slice();
            (
                self.swap.rate(zs).ln() - log_barrier,
                DVector::from_vec(self.swap.log_rate_gradient(zs)),
            )
        })
        .map_err(|e| match e {
            ConstrainedError::MaxIterations {
                iterations,
                violation,
            } => ProjectionError::DidNotConverge {
                method,
                iterations,
                residual: violation,
            },
            ConstrainedError::NonFinite { iteration }
            | ConstrainedError::DegenerateGradient { iteration } => {
                ProjectionError::DidNotConverge {
                    method,
                    iterations: iteration,
                    residual: f64::NAN,
                }
            }
        })?;

        Ok((outcome.z.as_slice().to_vec(), outcome.iterations))
    }
}
