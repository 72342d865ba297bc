// src/models/swap_rate.rs
//! Swap rate and discount factors of a log-forward curve
//!
//! # Mathematical Framework
//!
//! For log-forwards `x` with `L = exp(x)` and accrual `δ`, the discount
//! factors from the first reset date `T0` are
//! ```text
//! P_i = ∏_{j=0..i} 1 / (1 + δ L_j),   i = 0..N-1
//! ```
//! and the par swap rate is
//! ```text
//! S = (1 - P_{N-1}) / (δ Σ_i P_i)
//! ```
//! `S` is the convex combination `Σ (P_i / Σ P) L_i` and is non-decreasing
//! in every forward.

/// Swap rate functional of a forward curve with a fixed accrual `δ`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapRateFunction {
    pub tenor: f64,
}

impl SwapRateFunction {
    pub fn new(tenor: f64) -> Self {
        Self { tenor }
    }

    /// Par swap rate of the log-forward curve `x`
    pub fn rate(&self, x: &[f64]) -> f64 {
        let mut p = 1.0;
        let mut annuity = 0.0;
        for &xi in x {
            p /= 1.0 + self.tenor * xi.exp();
            annuity += p;
        }
        (1.0 - p) / (self.tenor * annuity)
    }

    /// Discount factors from `T0` to each subsequent reset date
    pub fn discount_curve(&self, x: &[f64]) -> Vec<f64> {
        let mut p = 1.0;
        x.iter()
            .map(|&xi| {
                p /= 1.0 + self.tenor * xi.exp();
                p
            })
            .collect()
    }

    /// Sum of the discount curve, the annuity multiplier used in payoff discounting
    pub fn annuity(&self, x: &[f64]) -> f64 {
        self.discount_curve(x).iter().sum()
    }

    /// Gradient of `ln S` with respect to the log-forwards
    ///
    /// ```text
    /// ∂ ln S / ∂x_k = v_k ( P_{N-1} / (1 - P_{N-1}) + Σ_{i≥k} P_i / Σ_i P_i ),
    /// v_k = δ L_k / (1 + δ L_k)
    /// ```
    pub fn log_rate_gradient(&self, x: &[f64]) -> Vec<f64> {
        let discounts = self.discount_curve(x);
        let n = discounts.len();
        let total: f64 = discounts.iter().sum();
        let last = discounts[n - 1];
        let terminal = last / (1.0 - last);

        let mut gradient = vec![0.0; n];
        let mut tail = 0.0;
        for k in (0..n).rev() {
            tail += discounts[k];
            let dl = self.tenor * x[k].exp();
            let v = dl / (1.0 + dl);
            gradient[k] = v * (terminal + tail / total);
        }
        gradient
    }
}
