//! # lmm-barrier: Knock-out swaptions under the LIBOR Market Model
//!
//! Monte Carlo pricing of a payer swaption that is knocked out as soon as the
//! par swap rate reaches an upper barrier before exercise.
//!
//! ## Key Features
//!
//! - **Tiered barrier test**: cheap coarse and fine bounds clear most steps;
//!   only steps near the barrier pay for a projection onto `{S = R}`
//! - **Two projectors**: reduced BFGS (default) and constrained SQP
//! - **Parallel and reproducible**: Rayon paths with per-path RNG streams,
//!   identical results for any number of workers
//! - **Analytic reference**: Swap Market Model approximation for validation
//!
//! ## Quick Start
//!
//! ```rust
//! use lmm_barrier::mc::mc_engine::{price_barrier_swaption, McConfig};
//! use lmm_barrier::models::params::ModelParameters;
//!
//! // Ten annual forwards at 5%, barrier at 7.5%
//! let params = ModelParameters::default();
//! let config = McConfig {
//!     paths: 2_000,
//!     ..Default::default()
//! };
//!
//! let result = price_barrier_swaption(params, config).expect("Valid configuration");
//! println!("Price: {:.4} ± {:.4}", result.price, result.std_error);
//! ```
//!
//! ## Mathematical Foundation
//!
//! Log-forwards follow the spot-measure LMM dynamics
//! ```text
//! dx_i = ( Σ_{j≤i} ρ_ij σ_i σ_j v_j - ½ σ_i² ) dt + σ_i dW_i
//! ```
//! discretised with correlated ±1 (or Gaussian) shocks. Near the barrier a
//! path is killed with probability `λ/(d+λ)`, where `d` is its distance to
//! the barrier manifold, which corrects the bias of monitoring only at
//! discrete steps.

// Module declarations
pub mod error;
pub mod rng;
pub mod math_utils;
pub mod models;
pub mod solvers;
pub mod mc;
pub mod analytics;

// Re-export commonly used types for convenience
pub use error::{LmmError, LmmResult};
