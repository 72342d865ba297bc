// src/analytics/swap_market.rs
//! Swap Market Model approximation of the knock-out swaption
//!
//! # Mathematical Foundation
//!
//! Freezing the weights `w_i = P_i / Σ P` at their initial values, the swap
//! rate `S = Σ w_i L_i` has lognormal volatility (Rebonato)
//! ```text
//! σ_S² = Σ_ij w_i w_j L_i L_j σ_i σ_j ρ_ij / S²
//! ```
//! Under the annuity measure `S` is a driftless geometric Brownian motion,
//! so the continuously monitored up-and-out call follows from the
//! reflection principle. With `X = ln(S_T/S_0) ~ N(-s²/2, s²)`,
//! `s = σ_S √T0` and `b = ln(H/S_0)`:
//! ```text
//! V = E[(S_0 e^X - K)⁺ 1{X < b}] - (S_0/H) E[((H²/S_0) e^X - K)⁺ 1{X < -b}]
//! ```
//! and the swaption price is `P(0,T0) δ A(0) V` with `A(0) = Σ_i P_i`.
//!
//! The discrete-step engine only approximates continuous monitoring, so the
//! two prices agree in magnitude, not to Monte Carlo precision.

use crate::error::{LmmError, LmmResult};
use crate::math_utils::norm_cdf;
use crate::models::correlation::CorrelationModel;
use crate::models::params::ModelParameters;
use crate::models::swap_rate::SwapRateFunction;
use nalgebra::DMatrix;

/// Closed-form or semi-analytic price used to validate the simulation
pub trait AnalyticReference {
    fn reference_price(&self, inputs: &ReferenceInputs) -> LmmResult<f64>;
}

/// Market and contract data needed by an [`AnalyticReference`]
#[derive(Debug, Clone)]
pub struct ReferenceInputs {
    pub initial_forwards: Vec<f64>,
    pub volatilities: Vec<f64>,
    pub correlation: DMatrix<f64>,
    pub maturity: f64,
    pub tenor: f64,
    pub strike: f64,
    pub barrier: f64,
}

impl ReferenceInputs {
    pub fn from_params(params: &ModelParameters) -> LmmResult<Self> {
        params.validate()?;
        let correlation = CorrelationModel::new(params)?;
        Ok(Self {
            initial_forwards: params.initial_forwards.clone(),
            volatilities: params.volatilities.clone(),
            correlation: correlation.correlation().clone(),
            maturity: params.maturity,
            tenor: params.tenor,
            strike: params.strike,
            barrier: params.barrier,
        })
    }

    fn log_forwards(&self) -> Vec<f64> {
        self.initial_forwards.iter().map(|l| l.ln()).collect()
    }

    /// P(0,T0) δ A(0): converts a swap-rate payoff into a price
    fn scaling(&self) -> f64 {
        let swap = SwapRateFunction::new(self.tenor);
        let discount = 1.0 / (1.0 + self.tenor * self.initial_forwards[0]);
        discount * self.tenor * swap.annuity(&self.log_forwards())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwapMarketApproximation;

impl SwapMarketApproximation {
    pub fn new() -> Self {
        SwapMarketApproximation
    }

    /// Frozen-weight lognormal volatility of the swap rate
    pub fn swap_volatility(&self, inputs: &ReferenceInputs) -> LmmResult<f64> {
        let n = inputs.initial_forwards.len();
        if inputs.volatilities.len() != n || inputs.correlation.shape() != (n, n) {
            return Err(LmmError::InvalidConfiguration {
                field: "reference inputs".to_string(),
                reason: format!(
                    "{} forwards, {} volatilities, {:?} correlation",
                    n,
                    inputs.volatilities.len(),
                    inputs.correlation.shape()
                ),
            });
        }

        let swap = SwapRateFunction::new(inputs.tenor);
        let x = inputs.log_forwards();
        let discounts = swap.discount_curve(&x);
        let total: f64 = discounts.iter().sum();
        let rate = swap.rate(&x);

        let weighted: Vec<f64> = (0..n)
            .map(|i| discounts[i] / total * inputs.initial_forwards[i] * inputs.volatilities[i])
            .collect();
        let mut variance = 0.0;
        for i in 0..n {
            for j in 0..n {
                variance += weighted[i] * weighted[j] * inputs.correlation[(i, j)];
            }
        }

        let vol = variance.max(0.0).sqrt() / rate;
        if !vol.is_finite() {
            return Err(LmmError::NumericalInstability {
                method: "swap volatility".to_string(),
                reason: format!("non-finite volatility for swap rate {}", rate),
            });
        }
        Ok(vol)
    }

    /// Undiscounted vanilla payer value `E[(S_T - K)⁺]` under the annuity measure
    pub fn vanilla_value(&self, inputs: &ReferenceInputs) -> LmmResult<f64> {
        let s0 = SwapRateFunction::new(inputs.tenor).rate(&inputs.log_forwards());
        let total_vol = self.swap_volatility(inputs)? * inputs.maturity.sqrt();
        Ok(black_call(s0, inputs.strike, total_vol))
    }

    /// Vanilla payer swaption price, the barrier-free upper bound
    pub fn vanilla_price(&self, inputs: &ReferenceInputs) -> LmmResult<f64> {
        Ok(inputs.scaling() * self.vanilla_value(inputs)?)
    }
}

impl AnalyticReference for SwapMarketApproximation {
    fn reference_price(&self, inputs: &ReferenceInputs) -> LmmResult<f64> {
        let s0 = SwapRateFunction::new(inputs.tenor).rate(&inputs.log_forwards());
        let h = inputs.barrier;
        let k = inputs.strike;
        if s0 >= h {
            return Err(LmmError::BarrierBreached {
                barrier: h,
                initial_swap_rate: s0,
            });
        }
        if k >= h {
            return Ok(0.0);
        }

        let s = self.swap_volatility(inputs)? * inputs.maturity.sqrt();
        let value = if s == 0.0 {
            (s0 - k).max(0.0)
        } else {
            let b = (h / s0).ln();
            let direct = capped_call(s0, k, b, s);
            let reflected = capped_call(h * h / s0, k, -b, s);
            (direct - s0 / h * reflected).max(0.0)
        };

        Ok(inputs.scaling() * value)
    }
}

/// Black call on a driftless forward with total volatility `s = σ√T`
pub fn black_call(forward: f64, strike: f64, s: f64) -> f64 {
    if s <= 0.0 || strike <= 0.0 {
        return (forward - strike).max(0.0);
    }
    let d1 = ((forward / strike).ln() + 0.5 * s * s) / s;
    let d2 = d1 - s;
    forward * norm_cdf(d1) - strike * norm_cdf(d2)
}

/// `E[(F e^X - K)⁺ 1{X < c}]` for `X ~ N(-s²/2, s²)`
///
/// ```text
/// = F [Φ((c - s²/2)/s) - Φ((l - s²/2)/s)] - K [Φ((c + s²/2)/s) - Φ((l + s²/2)/s)],
/// l = ln(K/F)
/// ```
fn capped_call(forward: f64, strike: f64, cap: f64, s: f64) -> f64 {
    let half = 0.5 * s * s;
    let upper_f = norm_cdf((cap - half) / s);
    let upper_k = norm_cdf((cap + half) / s);
    let (lower_f, lower_k) = if strike > 0.0 {
        let l = (strike / forward).ln();
        if l >= cap {
            return 0.0;
        }
        (norm_cdf((l - half) / s), norm_cdf((l + half) / s))
    } else {
        (0.0, 0.0)
    };
    forward * (upper_f - lower_f) - strike * (upper_k - lower_k)
}
