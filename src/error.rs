// src/error.rs
use crate::solvers::projection::ProjectionError;
use thiserror::Error;

/// Error types for the lmm-barrier library
#[derive(Debug, Clone, Error)]
pub enum LmmError {
    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Invalid configuration (shapes, counts, worker pool)
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// The barrier is already touched by the initial curve
    #[error(
        "Barrier {barrier:.6} must exceed the initial swap rate {initial_swap_rate:.6}; \
         the option would be knocked out at inception"
    )]
    BarrierBreached {
        barrier: f64,
        initial_swap_rate: f64,
    },

    /// Numerical instability (non-PD correlation, log of a non-positive value, NaN results)
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },

    /// Barrier projection did not converge; fatal for the whole run
    #[error("Barrier projection failed on path {path} at step {step}: {source}")]
    ProjectionFailure {
        path: usize,
        step: usize,
        #[source]
        source: ProjectionError,
    },
}

/// Coarse classification of [`LmmError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Numerical,
    Projection,
}

impl LmmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LmmError::InvalidParameters { .. }
            | LmmError::InvalidConfiguration { .. }
            | LmmError::BarrierBreached { .. } => ErrorKind::Configuration,
            LmmError::NumericalInstability { .. } => ErrorKind::Numerical,
            LmmError::ProjectionFailure { .. } => ErrorKind::Projection,
        }
    }
}

/// Result type alias for lmm-barrier operations
pub type LmmResult<T> = Result<T, LmmError>;

/// Validation utilities
pub mod validation {
    use super::{LmmError, LmmResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> LmmResult<()> {
        if !(value > 0.0) || !value.is_finite() {
            Err(LmmError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive and finite (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> LmmResult<()> {
        if !(value >= 0.0) || !value.is_finite() {
            Err(LmmError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative and finite (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> LmmResult<()> {
        if !value.is_finite() {
            Err(LmmError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate every entry of a vector with `check`, reporting the offending index
    pub fn validate_each<F>(name: &str, values: &[f64], check: F) -> LmmResult<()>
    where
        F: Fn(&str, f64) -> LmmResult<()>,
    {
        for (i, &v) in values.iter().enumerate() {
            check(&format!("{}[{}]", name, i), v)?;
        }
        Ok(())
    }

    /// Validate that two vectors have matching lengths
    pub fn validate_len(name: &str, actual: usize, expected: usize) -> LmmResult<()> {
        if actual != expected {
            Err(LmmError::InvalidConfiguration {
                field: name.to_string(),
                reason: format!("length {} does not match curve length {}", actual, expected),
            })
        } else {
            Ok(())
        }
    }

    /// Validate paths count
    pub fn validate_paths(paths: usize) -> LmmResult<()> {
        if paths == 0 {
            Err(LmmError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > 1_000_000_000 {
            Err(LmmError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> LmmResult<()> {
        if steps == 0 {
            Err(LmmError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > 100_000 {
            Err(LmmError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
