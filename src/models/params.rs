// src/models/params.rs
use super::swap_rate::SwapRateFunction;
use crate::error::{validation::*, LmmError, LmmResult};

/// Inputs of the knock-out swaption under the LIBOR Market Model
#[derive(Clone, Debug, PartialEq)]
pub struct ModelParameters {
    pub tenor: f64,                 // Accrual period δ
    pub maturity: f64,              // Option exercise date T0
    pub steps: usize,               // Time steps M to T0
    pub strike: f64,                // Swaption strike K
    pub barrier: f64,               // Knock-out level on the swap rate
    pub initial_forwards: Vec<f64>, // L0, one per accrual period
    pub volatilities: Vec<f64>,     // σ per forward
    pub beta: f64,                  // Correlation decay
}

impl ModelParameters {
    /// Number of forward rates N
    pub fn n_rates(&self) -> usize {
        self.initial_forwards.len()
    }

    /// Step size h = T0 / M
    pub fn dt(&self) -> f64 {
        self.maturity / self.steps as f64
    }

    pub fn log_initial_forwards(&self) -> Vec<f64> {
        self.initial_forwards.iter().map(|l| l.ln()).collect()
    }

    pub fn swap_rate_function(&self) -> SwapRateFunction {
        SwapRateFunction::new(self.tenor)
    }

    pub fn initial_swap_rate(&self) -> f64 {
        self.swap_rate_function().rate(&self.log_initial_forwards())
    }

    /// Discount factor P(0, T0) = 1 / (1 + δ L0_0) applied to every payoff
    pub fn discount_to_maturity(&self) -> f64 {
        1.0 / (1.0 + self.tenor * self.initial_forwards[0])
    }

    pub fn sigma_max(&self) -> f64 {
        self.volatilities.iter().copied().fold(0.0, f64::max)
    }

    /// Validate all model parameters, including the barrier against the initial curve
    pub fn validate(&self) -> LmmResult<()> {
        if self.initial_forwards.is_empty() {
            return Err(LmmError::InvalidConfiguration {
                field: "initial_forwards".to_string(),
                reason: "at least one forward rate is required".to_string(),
            });
        }
        validate_positive("tenor", self.tenor)?;
        validate_positive("maturity", self.maturity)?;
        validate_steps(self.steps)?;
        validate_finite("strike", self.strike)?;
        validate_positive("barrier", self.barrier)?;
        validate_non_negative("beta", self.beta)?;
        validate_each("initial_forwards", &self.initial_forwards, validate_positive)?;
        validate_len("volatilities", self.volatilities.len(), self.n_rates())?;
        validate_each("volatilities", &self.volatilities, validate_non_negative)?;

        let initial_swap_rate = self.initial_swap_rate();
        if !initial_swap_rate.is_finite() {
            return Err(LmmError::NumericalInstability {
                method: "initial swap rate".to_string(),
                reason: format!("swap rate of the initial curve is {}", initial_swap_rate),
            });
        }
        if self.barrier <= initial_swap_rate {
            return Err(LmmError::BarrierBreached {
                barrier: self.barrier,
                initial_swap_rate,
            });
        }

        Ok(())
    }
}

impl Default for ModelParameters {
    /// Ten annual forwards at 5%, 10% volatility, barrier at 7.5%
    fn default() -> Self {
        ModelParameters {
            tenor: 1.0,
            maturity: 10.0,
            steps: 100,
            strike: 0.01,
            barrier: 0.075,
            initial_forwards: vec![0.05; 10],
            volatilities: vec![0.10; 10],
            beta: 0.1,
        }
    }
}
