// src/solvers/bfgs.rs
//! BFGS quasi-Newton minimisation with backtracking line search
//!
//! # Algorithm
//!
//! With inverse-Hessian estimate `H_k` and gradient `g_k`:
//! ```text
//! d_k     = -H_k g_k
//! x_{k+1} = x_k + t d_k          (t halved until the Armijo condition holds)
//! s = x_{k+1} - x_k,  y = g_{k+1} - g_k,  ρ = 1 / (yᵀs)
//! H_{k+1} = (I - ρ s yᵀ) H_k (I - ρ y sᵀ) + ρ s sᵀ
//! ```
//! The first update rescales `H_0 = I` by `yᵀs / yᵀy`. Non-finite objective
//! values are treated as infeasible and rejected by the line search.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BfgsOptions {
    pub max_iterations: usize,
    pub gradient_tolerance: f64,
    pub max_backtracks: usize,
    pub armijo: f64,
    /// Gradient level accepted when the iterate stops moving at machine precision
    pub stall_tolerance: f64,
}

impl Default for BfgsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gradient_tolerance: 1e-10,
            max_backtracks: 60,
            armijo: 1e-4,
            stall_tolerance: 1e-7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BfgsOutcome {
    pub x: DVector<f64>,
    pub value: f64,
    pub gradient_norm: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BfgsError {
    #[error("objective is not finite at the starting point")]
    NonFiniteStart,

    #[error("no convergence after {iterations} iterations (|g| = {gradient_norm:.3e})")]
    MaxIterations { iterations: usize, gradient_norm: f64 },

    #[error("line search failed at iteration {iteration} (|g| = {gradient_norm:.3e})")]
    LineSearch { iteration: usize, gradient_norm: f64 },
}

/// Minimise `objective`, which returns the value and gradient at a point
pub fn minimize<F>(
    x0: DVector<f64>,
    options: &BfgsOptions,
    mut objective: F,
) -> Result<BfgsOutcome, BfgsError>
where
    F: FnMut(&DVector<f64>) -> (f64, DVector<f64>),
{
    let n = x0.len();
    let mut x = x0;
    let (mut fx, mut g) = objective(&x);
    if !fx.is_finite() || g.iter().any(|v| !v.is_finite()) {
        return Err(BfgsError::NonFiniteStart);
    }

    let identity = DMatrix::<f64>::identity(n, n);
    let mut h = identity.clone();
    let mut first_update = true;

    for iteration in 0..options.max_iterations {
        let gradient_norm = g.amax();
        if gradient_norm <= options.gradient_tolerance {
            return Ok(BfgsOutcome {
                x,
                value: fx,
                gradient_norm,
                iterations: iteration,
            });
        }

        let mut direction = -(&h * &g);
        let mut slope = g.dot(&direction);
        if slope >= 0.0 {
            // Curvature information went stale: restart from steepest descent
            h = identity.clone();
            first_update = true;
            direction = -g.clone();
            slope = -g.norm_squared();
        }

        let mut t = 1.0;
        let mut accepted = None;
        for _ in 0..options.max_backtracks {
            let candidate = &x + &direction * t;
            let (f_new, g_new) = objective(&candidate);
            if f_new.is_finite() && f_new <= fx + options.armijo * t * slope {
                accepted = Some((candidate, f_new, g_new));
                break;
            }
            t *= 0.5;
        }

        let (x_new, f_new, g_new) = match accepted {
            Some(step) => step,
            None => {
                return Err(BfgsError::LineSearch {
                    iteration,
                    gradient_norm,
                })
            }
        };

        let s = &x_new - &x;
        if s.amax() == 0.0 {
            return if gradient_norm <= options.stall_tolerance {
                Ok(BfgsOutcome {
                    x,
                    value: fx,
                    gradient_norm,
                    iterations: iteration,
                })
            } else {
                Err(BfgsError::LineSearch {
                    iteration,
                    gradient_norm,
                })
            };
        }
        let y = &g_new - &g;
        let sy = s.dot(&y);
        if sy > f64::EPSILON * s.norm() * y.norm() {
            if first_update {
                h = &identity * (sy / y.norm_squared());
                first_update = false;
            }
            let rho = 1.0 / sy;
            let left = &identity - (&s * y.transpose()) * rho;
            let right = &identity - (&y * s.transpose()) * rho;
            h = &left * &h * &right + (&s * s.transpose()) * rho;
        }

        x = x_new;
        fx = f_new;
        g = g_new;
    }

    let gradient_norm = g.amax();
    if gradient_norm <= options.gradient_tolerance {
        Ok(BfgsOutcome {
            x,
            value: fx,
            gradient_norm,
            iterations: options.max_iterations,
        })
    } else {
        Err(BfgsError::MaxIterations {
            iterations: options.max_iterations,
            gradient_norm,
        })
    }
}
