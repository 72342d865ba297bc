// src/mc/mc_engine.rs
use crate::error::{validation::*, LmmError, LmmResult};
use crate::math_utils::Timer;
use crate::mc::path::{PathContext, PathResult, PathSimulator, PathStatus, TierCounts};
use crate::models::params::ModelParameters;
use crate::rng::RngFactory;
use crate::solvers::lmm_step::ShockScheme;
use crate::solvers::projection::{ProjectionMethod, ProjectionOptions};
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct McConfig {
    pub paths: usize,
    pub seed: u64,
    pub scheme: ShockScheme,
    pub projection: ProjectionMethod,
    pub projection_options: ProjectionOptions,
    pub threads: Option<usize>, // Dedicated worker pool size (default: global rayon pool)
}

impl McConfig {
    /// Validate the Monte Carlo configuration
    pub fn validate(&self) -> LmmResult<()> {
        validate_paths(self.paths)?;

        if let Some(threads) = self.threads {
            if threads == 0 {
                return Err(LmmError::InvalidConfiguration {
                    field: "threads".to_string(),
                    reason: "must be greater than 0 when set".to_string(),
                });
            }
        }

        let options = &self.projection_options;
        if options.max_iterations == 0 {
            return Err(LmmError::InvalidConfiguration {
                field: "projection_options.max_iterations".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        validate_positive("projection_options.gradient_tolerance", options.gradient_tolerance)?;
        validate_positive("projection_options.step_tolerance", options.step_tolerance)?;
        validate_positive("projection_options.barrier_tolerance", options.barrier_tolerance)?;

        Ok(())
    }
}

impl Default for McConfig {
    fn default() -> Self {
        McConfig {
            paths: 100_000,
            seed: 12345,
            scheme: ShockScheme::Discrete,
            projection: ProjectionMethod::Reduced,
            projection_options: ProjectionOptions::default(),
            threads: None,
        }
    }
}

/// Outcome of a full Monte Carlo run
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub price: f64,
    pub std_error: f64,
    pub mean_exit_time: f64,
    pub paths: usize,
    pub knocked_out: usize,
    pub tiers: TierCounts,
    pub elapsed_ms: f64,
}

impl AggregateResult {
    pub fn survival_rate(&self) -> f64 {
        1.0 - self.knocked_out as f64 / self.paths as f64
    }

    /// Reduce per-path results in index order
    ///
    /// The fold is sequential so the aggregate does not depend on how the
    /// paths were scheduled.
    pub fn from_paths(results: &[PathResult], elapsed_ms: f64) -> LmmResult<Self> {
        let n = results.len();
        if n == 0 {
            return Err(LmmError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "no path results to aggregate".to_string(),
            });
        }

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut sum_exit = 0.0;
        let mut knocked_out = 0;
        let mut tiers = TierCounts::default();
        for r in results {
            sum += r.price_contribution;
            sum_sq += r.price_contribution * r.price_contribution;
            sum_exit += r.exit_time;
            if r.outcome == PathStatus::KnockedOut {
                knocked_out += 1;
            }
            tiers.merge(&r.tiers);
        }

        let nf = n as f64;
        let price = sum / nf;
        let variance = if n > 1 {
            ((sum_sq - nf * price * price) / (nf - 1.0)).max(0.0)
        } else {
            0.0
        };
        let std_error = (variance / nf).sqrt();
        let mean_exit_time = sum_exit / nf;

        if !price.is_finite() || !std_error.is_finite() || !mean_exit_time.is_finite() {
            return Err(LmmError::NumericalInstability {
                method: "Monte Carlo aggregation".to_string(),
                reason: format!(
                    "non-finite estimate (price {}, std error {}, exit time {})",
                    price, std_error, mean_exit_time
                ),
            });
        }

        Ok(AggregateResult {
            price,
            std_error,
            mean_exit_time,
            paths: n,
            knocked_out,
            tiers,
            elapsed_ms,
        })
    }
}

/// Monte Carlo pricer for the knock-out swaption
///
/// # Math Framework
///
/// Under the spot LIBOR measure the price of the option exercised at `T0` is
/// ```text
/// V = P(0,T0) E[ 1{τ > T0} δ (S(T0) - K)⁺ Σ_i P(T0, T_{i+1}) ]
/// ```
/// where `τ` is the first time the swap rate reaches the barrier. Each path
/// is simulated by [`PathSimulator`] with its own RNG stream keyed on
/// `(seed, path index)`, so the estimate does not depend on the number of
/// worker threads.
///
/// # Errors
///
/// Returns `LmmError` for:
/// - Invalid parameters or configuration, before any path runs
/// - A barrier projection that fails on any path
/// - Non-finite aggregate estimates
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    context: PathContext,
    config: McConfig,
    rngs: RngFactory,
}

impl MonteCarloEngine {
    pub fn new(params: ModelParameters, config: McConfig) -> LmmResult<Self> {
        config.validate()?;
        let context = PathContext::new(
            params,
            config.scheme,
            config.projection,
            config.projection_options,
        )?;

        let p = context.params();
        tracing::debug!(
            n_rates = p.n_rates(),
            dt = p.dt(),
            sigma_max = context.correlation().sigma_max(),
            coarse_bound = context.bounds().coarse_bound(),
            initial_swap_rate = p.initial_swap_rate(),
            scheme = config.scheme.name(),
            projection = config.projection.name(),
            "Monte Carlo engine ready"
        );

        Ok(Self {
            context,
            rngs: RngFactory::new(config.seed),
            config,
        })
    }

    pub fn params(&self) -> &ModelParameters {
        self.context.params()
    }

    pub fn config(&self) -> &McConfig {
        &self.config
    }

    pub fn context(&self) -> &PathContext {
        &self.context
    }

    /// Simulate path `path` on its own stream
    pub fn simulate_path(&self, path: usize) -> LmmResult<PathResult> {
        let mut rng = self.rngs.path_rng(path as u64);
        PathSimulator::new(&self.context).run(path, &mut rng)
    }

    pub fn run(&self) -> LmmResult<AggregateResult> {
        let timer = Timer::new();

        let results = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| LmmError::InvalidConfiguration {
                        field: "threads".to_string(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(threads, "running on dedicated thread pool");
                pool.install(|| self.simulate_all())?
            }
            None => self.simulate_all()?,
        };

        let aggregate = AggregateResult::from_paths(&results, timer.elapsed_ms())?;
        tracing::info!(
            price = aggregate.price,
            std_error = aggregate.std_error,
            mean_exit_time = aggregate.mean_exit_time,
            paths = aggregate.paths,
            knocked_out = aggregate.knocked_out,
            coarse_steps = aggregate.tiers.coarse,
            fine_steps = aggregate.tiers.fine,
            boundary_steps = aggregate.tiers.boundary,
            elapsed_ms = aggregate.elapsed_ms,
            "Monte Carlo run complete"
        );
        Ok(aggregate)
    }

    /// A failing run reports its lowest failing path, whatever the worker count
    fn simulate_all(&self) -> LmmResult<Vec<PathResult>> {
        let results: Vec<LmmResult<PathResult>> = (0..self.config.paths)
            .into_par_iter()
            .map(|i| self.simulate_path(i))
            .collect();
        results.into_iter().collect()
    }
}

/// Build an engine and run it once
pub fn price_barrier_swaption(
    params: ModelParameters,
    config: McConfig,
) -> LmmResult<AggregateResult> {
    MonteCarloEngine::new(params, config)?.run()
}
