// src/solvers/constrained.rs
//! Euclidean projection onto a level set `{z : c(z) = 0}`
//!
//! # Mathematical Framework
//!
//! Minimise `‖z - x‖²` subject to `c(z) = 0`. The KKT conditions are
//! ```text
//! z - x + μ ∇c(z) = 0,    c(z) = 0
//! ```
//! Each SQP iteration linearises the constraint at the current iterate `z_k`
//! and solves the resulting quadratic programme exactly:
//! ```text
//! μ_k     = (c(z_k) + ∇c(z_k)ᵀ (x - z_k)) / ‖∇c(z_k)‖²
//! z_{k+1} = x - μ_k ∇c(z_k)
//! ```
//! The step is halved while it increases the constraint violation. A fixed
//! point of the iteration satisfies the KKT system.

use nalgebra::DVector;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainedOptions {
    pub max_iterations: usize,
    pub constraint_tolerance: f64,
    pub step_tolerance: f64,
    pub max_backtracks: usize,
}

impl Default for ConstrainedOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            constraint_tolerance: 1e-12,
            step_tolerance: 1e-12,
            max_backtracks: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstrainedOutcome {
    pub z: DVector<f64>,
    pub multiplier: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstrainedError {
    #[error("constraint or its gradient is not finite at iteration {iteration}")]
    NonFinite { iteration: usize },

    #[error("constraint gradient vanished at iteration {iteration}")]
    DegenerateGradient { iteration: usize },

    #[error("no convergence after {iterations} iterations (|c| = {violation:.3e})")]
    MaxIterations { iterations: usize, violation: f64 },
}

/// Project `x` onto the zero set of `constraint`, which returns `(c(z), ∇c(z))`
pub fn project_onto_level_set<F>(
    x: &DVector<f64>,
    options: &ConstrainedOptions,
    mut constraint: F,
) -> Result<ConstrainedOutcome, ConstrainedError>
where
    F: FnMut(&DVector<f64>) -> (f64, DVector<f64>),
{
    let mut z = x.clone();
    let (mut c, mut grad) = constraint(&z);

    for iteration in 0..options.max_iterations {
        if !c.is_finite() || grad.iter().any(|v| !v.is_finite()) {
            return Err(ConstrainedError::NonFinite { iteration });
        }
        let grad_sq = grad.norm_squared();
        if grad_sq <= f64::MIN_POSITIVE {
            return Err(ConstrainedError::DegenerateGradient { iteration });
        }

        let multiplier = (c + grad.dot(&(x - &z))) / grad_sq;
        let step = (x - &grad * multiplier) - &z;

        let mut t = 1.0;
        let mut accepted = None;
        for _ in 0..options.max_backtracks {
            let candidate = &z + &step * t;
            let (c_new, grad_new) = constraint(&candidate);
            if c_new.is_finite() && c_new.abs() <= c.abs().max(options.constraint_tolerance) {
                accepted = Some((candidate, c_new, grad_new));
                break;
            }
            t *= 0.5;
        }
        let (z_new, c_new, grad_new) = match accepted {
            Some(next) => next,
            None => return Err(ConstrainedError::NonFinite { iteration }),
        };

        let moved = (step * t).amax();
        z = z_new;
        c = c_new;
        grad = grad_new;

        if c.abs() <= options.constraint_tolerance && moved <= options.step_tolerance {
            return Ok(ConstrainedOutcome {
                z,
                multiplier,
                iterations: iteration + 1,
            });
        }
    }

    Err(ConstrainedError::MaxIterations {
        iterations: options.max_iterations,
        violation: c.abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_onto_hyperplane_is_exact() {
        // c(z) = aᵀz - b, projection is x - (aᵀx - b) a / ‖a‖²
        let a = DVector::from_vec(vec![1.0, 2.0, -1.0]);
        let b = 3.0;
        let x = DVector::from_vec(vec![0.5, 0.1, 0.2]);
        let outcome = project_onto_level_set(&x, &ConstrainedOptions::default(), |z| {
            (a.dot(z) - b, a.clone())
        })
        .expect("linear constraint converges");

        let expected = &x - &a * ((a.dot(&x) - b) / a.norm_squared());
        for i in 0..3 {
            assert_relative_eq!(outcome.z[i], expected[i], epsilon = 1e-12);
        }
        assert_relative_eq!(
            outcome.multiplier,
            (a.dot(&x) - b) / a.norm_squared(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_projection_onto_sphere() {
        let x = DVector::from_vec(vec![3.0, 4.0]);
        let outcome = project_onto_level_set(&x, &ConstrainedOptions::default(), |z| {
            (z.norm_squared() - 1.0, z * 2.0)
        })
        .expect("sphere converges");

        assert_relative_eq!(outcome.z[0], 0.6, epsilon = 1e-10);
        assert_relative_eq!(outcome.z[1], 0.8, epsilon = 1e-10);
        // z - x + μ ∇c(z) = 0 with ∇c = 2z
        assert_relative_eq!(outcome.multiplier, 2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_degenerate_gradient() {
        let x = DVector::from_vec(vec![1.0]);
        let err = project_onto_level_set(&x, &ConstrainedOptions::default(), |_| {
            (1.0, DVector::zeros(1))
        })
        .unwrap_err();
        assert_eq!(err, ConstrainedError::DegenerateGradient { iteration: 0 });
    }
}
