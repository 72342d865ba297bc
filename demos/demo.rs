// demos/demo.rs
use lmm_barrier::analytics::swap_market::{
    AnalyticReference, ReferenceInputs, SwapMarketApproximation,
};
use lmm_barrier::mc::mc_engine::{price_barrier_swaption, McConfig, MonteCarloEngine};
use lmm_barrier::mc::path::PathStatus;
use lmm_barrier::models::params::ModelParameters;
use lmm_barrier::solvers::lmm_step::ShockScheme;
use lmm_barrier::solvers::projection::ProjectionMethod;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let paths = std::env::args()
        .nth(1)
        .and_then(|a| a.parse().ok())
        .unwrap_or(50_000);

    println!("Running lmm-barrier Monte Carlo Demo\n");
    run_reference_case(paths);
    run_single_paths();
    run_barrier_sweep(paths / 5);
}

fn run_reference_case(paths: usize) {
    println!("--- Reference Case ---");
    let params = ModelParameters::default();
    println!(
        "N = {}, δ = {}, T0 = {}, M = {}, K = {}, R = {}, S(0) = {:.6}",
        params.n_rates(),
        params.tenor,
        params.maturity,
        params.steps,
        params.strike,
        params.barrier,
        params.initial_swap_rate()
    );

    let model = SwapMarketApproximation::new();
    let inputs = ReferenceInputs::from_params(&params).expect("Valid parameters");
    let reference = model.reference_price(&inputs).expect("Reference price");
    let vanilla = model.vanilla_price(&inputs).expect("Vanilla price");
    println!("Swap Market Model knock-out price: {:.6}", reference);
    println!("Swap Market Model vanilla price:   {:.6}\n", vanilla);

    for scheme in [ShockScheme::Discrete, ShockScheme::Gaussian] {
        for projection in [ProjectionMethod::Reduced, ProjectionMethod::Constrained] {
            let config = McConfig {
                paths,
                scheme,
                projection,
                ..Default::default()
            };
            let r = price_barrier_swaption(params.clone(), config).expect("Valid configuration");
            println!(
                "{:>9} / {:<11} price {:.6} ± {:.6}  exit {:.3}  survival {:.4}  ({:.0} ms)",
                scheme.name(),
                projection.name(),
                r.price,
                r.std_error,
                r.mean_exit_time,
                r.survival_rate(),
                r.elapsed_ms
            );
            let total = r.tiers.total() as f64;
            println!(
                "          tiers: coarse {:.1}%  fine {:.1}%  boundary {:.2}%",
                100.0 * r.tiers.coarse as f64 / total,
                100.0 * r.tiers.fine as f64 / total,
                100.0 * r.tiers.boundary as f64 / total
            );
        }
    }
    println!();
}

fn run_single_paths() {
    println!("--- Individual Paths ---");
    let engine = MonteCarloEngine::new(ModelParameters::default(), McConfig::default())
        .expect("Valid configuration");
    for path in 0..8 {
        let r = engine.simulate_path(path).expect("Path simulation");
        match r.outcome {
            PathStatus::KnockedOut => println!(
                "path {}: knocked out at t = {:.1} (step {})",
                path, r.exit_time, r.exit_step
            ),
            _ => println!(
                "path {}: survived, payoff {:.6}, discounted {:.6}",
                path, r.payoff, r.price_contribution
            ),
        }
    }
    println!();
}

fn run_barrier_sweep(paths: usize) {
    println!("--- Barrier Sweep ---");
    println!("{:>8} {:>12} {:>12} {:>12}", "Barrier", "MC", "Std Err", "SMM");
    let model = SwapMarketApproximation::new();
    for barrier in [0.06, 0.065, 0.07, 0.075, 0.085, 0.1, 0.15] {
        let params = ModelParameters {
            barrier,
            ..Default::default()
        };
        let reference = ReferenceInputs::from_params(&params)
            .and_then(|inputs| model.reference_price(&inputs))
            .expect("Reference price");
        let config = McConfig {
            paths,
            ..Default::default()
        };
        match price_barrier_swaption(params, config) {
            Ok(r) => println!(
                "{:>8.3} {:>12.6} {:>12.6} {:>12.6}",
                barrier, r.price, r.std_error, reference
            ),
            Err(e) => println!("{:>8.3} failed: {}", barrier, e),
        }
    }
}
