// src/mc/path.rs
//! Single Monte Carlo path of the knock-out swaption
//!
//! # State Machine
//!
//! ```text
//! Evolving ──(boundary zone, u < λ/(d+λ))──▶ KnockedOut
//!    │
//!    └──(step M reached)──▶ Survived
//! ```
//! Each step classifies the curve with the tier checks. Safe steps take a
//! standard LMM step. In the boundary zone the curve is projected onto
//! `{S = R}` at distance `d`; the path is killed with probability
//! `λ/(d+λ)`, otherwise it is pulled towards the projection by
//! `min(λ/d, 1)` before the standard step.

use crate::error::{LmmError, LmmResult};
use crate::math_utils::euclidean_distance;
use crate::models::correlation::CorrelationModel;
use crate::models::params::ModelParameters;
use crate::models::swap_rate::SwapRateFunction;
use crate::rng;
use crate::solvers::barrier_checks::{BarrierTier, StepBounds};
use crate::solvers::lmm_step::{LmmStepper, ShockScheme};
use crate::solvers::projection::{BarrierProjector, ProjectionMethod, ProjectionOptions};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Evolving,
    KnockedOut,
    Survived,
}

/// How many steps each tier decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub coarse: u64,
    pub fine: u64,
    pub boundary: u64,
}

impl TierCounts {
    fn record(&mut self, tier: BarrierTier) {
        match tier {
            BarrierTier::CoarseSafe => self.coarse += 1,
            BarrierTier::FineSafe => self.fine += 1,
            BarrierTier::BoundaryZone => self.boundary += 1,
        }
    }

    pub fn merge(&mut self, other: &TierCounts) {
        self.coarse += other.coarse;
        self.fine += other.fine;
        self.boundary += other.boundary;
    }

    pub fn total(&self) -> u64 {
        self.coarse + self.fine + self.boundary
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathState {
    pub log_forwards: Vec<f64>,
    pub step: usize,
    pub status: PathStatus,
    pub exit_step: Option<usize>,
}

impl PathState {
    pub fn new(log_forwards: Vec<f64>) -> Self {
        Self {
            log_forwards,
            step: 0,
            status: PathStatus::Evolving,
            exit_step: None,
        }
    }

    fn finish(&mut self, status: PathStatus, step: usize) {
        self.status = status;
        self.exit_step = Some(step);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub outcome: PathStatus,
    pub exit_step: usize,
    pub exit_time: f64,
    pub payoff: f64,
    pub price_contribution: f64,
    pub tiers: TierCounts,
}

/// Model objects shared read-only by every path
#[derive(Debug, Clone)]
pub struct PathContext {
    params: ModelParameters,
    correlation: CorrelationModel,
    swap: SwapRateFunction,
    bounds: StepBounds,
    stepper: LmmStepper,
    projector: BarrierProjector,
    initial_log_forwards: Vec<f64>,
    discount: f64,
}

impl PathContext {
    /// Validates the parameters and builds correlation, bounds and projector
    pub fn new(
        params: ModelParameters,
        scheme: ShockScheme,
        method: ProjectionMethod,
        options: ProjectionOptions,
    ) -> LmmResult<Self> {
        params.validate()?;
        let correlation = CorrelationModel::new(&params)?;
        let swap = params.swap_rate_function();
        let bounds = StepBounds::new(&params, &correlation);
        let stepper = LmmStepper::new(params.tenor, params.dt(), params.volatilities.clone(), scheme);
        let projector = BarrierProjector::new(swap, params.barrier, method, options);
        let initial_log_forwards = params.log_initial_forwards();
        let discount = params.discount_to_maturity();

        Ok(Self {
            params,
            correlation,
            swap,
            bounds,
            stepper,
            projector,
            initial_log_forwards,
            discount,
        })
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn correlation(&self) -> &CorrelationModel {
        &self.correlation
    }

    pub fn bounds(&self) -> &StepBounds {
        &self.bounds
    }

    pub fn projector(&self) -> &BarrierProjector {
        &self.projector
    }

    pub fn swap(&self) -> &SwapRateFunction {
        &self.swap
    }
}

/// Runs one path against a shared [`PathContext`]
pub struct PathSimulator<'a> {
    context: &'a PathContext,
}

impl<'a> PathSimulator<'a> {
    pub fn new(context: &'a PathContext) -> Self {
        Self { context }
    }

    pub fn run<R: Rng + ?Sized>(&self, path: usize, rng: &mut R) -> LmmResult<PathResult> {
        let ctx = self.context;
        let n = ctx.params.n_rates();
        let steps = ctx.params.steps;
        let barrier = ctx.params.barrier;
        let lambda = ctx.bounds.coarse_bound();

        let mut state = PathState::new(ctx.initial_log_forwards.clone());
        let mut tiers = TierCounts::default();
        let mut drift = vec![0.0; n];

        while state.status == PathStatus::Evolving && state.step < steps {
            let k = state.step;
            ctx.stepper.drift(&ctx.correlation, &state.log_forwards, &mut drift);

            let tier = ctx.bounds.classify(&ctx.swap, &state.log_forwards);
            tiers.record(tier);

            if tier == BarrierTier::BoundaryZone {
                let x = &mut state.log_forwards;
                if ctx.swap.rate(x) >= barrier {
                    state.finish(PathStatus::KnockedOut, k);
                    break;
                }

                let projection = ctx.projector.project(x).map_err(|source| {
                    tracing::error!(path, step = k, error = %source, "barrier projection failed");
                    LmmError::ProjectionFailure {
                        path,
                        step: k,
                        source,
                    }
                })?;
                let d = euclidean_distance(x, &projection.point);

                let u = rng::get_uniform_draw(rng);
                if d == 0.0 || u < lambda / (d + lambda) {
                    state.finish(PathStatus::KnockedOut, k);
                    break;
                }

                let pull = (lambda / d).min(1.0);
                for (xi, &zi) in x.iter_mut().zip(&projection.point) {
                    *xi += pull * (zi - *xi);
                }
            }

            ctx.stepper
                .step(&ctx.correlation, &mut state.log_forwards, &drift, rng);
            state.step += 1;
        }

        if state.status == PathStatus::Evolving {
            state.finish(PathStatus::Survived, steps);
        }

        let exit_step = state.exit_step.unwrap_or(steps);
        let (payoff, price_contribution) = match state.status {
            PathStatus::Survived => {
                let x = &state.log_forwards;
                let payoff = ctx.params.tenor * (ctx.swap.rate(x) - ctx.params.strike).max(0.0);
                (payoff, ctx.discount * ctx.swap.annuity(x) * payoff)
            }
            _ => (0.0, 0.0),
        };

        Ok(PathResult {
            outcome: state.status,
            exit_step,
            exit_time: exit_step as f64 * ctx.params.dt(),
            payoff,
            price_contribution,
            tiers,
        })
    }
}
