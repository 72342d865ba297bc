// tests/integration_test.rs
use lmm_barrier::error::{ErrorKind, LmmError};
use lmm_barrier::mc::mc_engine::{price_barrier_swaption, McConfig, MonteCarloEngine};
use lmm_barrier::models::params::ModelParameters;
use lmm_barrier::solvers::lmm_step::ShockScheme;
use lmm_barrier::solvers::projection::{ProjectionMethod, ProjectionOptions};

// Reference case, 100 000 paths, default seed and settings
const REFERENCE_PRICE: f64 = 0.2225;

#[test]
fn test_reference_case_end_to_end() {
    let config = McConfig {
        paths: 100_000,
        ..Default::default()
    };
    let result =
        price_barrier_swaption(ModelParameters::default(), config).expect("Valid configuration");

    println!("\nPrice: {:.6} ± {:.6}", result.price, result.std_error);
    println!("Mean exit time: {:.4}", result.mean_exit_time);
    println!("Survival rate: {:.4}", result.survival_rate());
    println!("Tiers: {:?}", result.tiers);

    // REFERENCE_PRICE is itself a 100k-path estimate
    let tolerance = 4.0 * std::f64::consts::SQRT_2 * result.std_error;
    assert!(
        (result.price - REFERENCE_PRICE).abs() < tolerance,
        "price {} is more than {:.5} away from {}",
        result.price,
        tolerance,
        REFERENCE_PRICE
    );
    assert!(
        result.mean_exit_time > 9.26 && result.mean_exit_time < 9.33,
        "mean exit time {} outside 9.26..9.33",
        result.mean_exit_time
    );
    assert!(result.std_error > 2e-4 && result.std_error < 6e-4);

    // Roughly 18% of paths are knocked out
    let knocked_out = result.knocked_out as f64 / result.paths as f64;
    assert!(knocked_out > 0.16 && knocked_out < 0.20, "knock-out rate {}", knocked_out);

    // Most steps are cleared by the cheap tiers
    assert!(result.tiers.coarse > result.tiers.boundary);
    assert!(result.tiers.boundary > 0);
}

#[test]
fn test_knock_out_cheaper_than_vanilla() {
    let config = McConfig {
        paths: 10_000,
        ..Default::default()
    };
    let knock_out = price_barrier_swaption(ModelParameters::default(), config.clone())
        .expect("Valid configuration");
    let vanilla = price_barrier_swaption(
        ModelParameters {
            barrier: 10.0,
            ..Default::default()
        },
        config,
    )
    .expect("Valid configuration");

    assert_eq!(vanilla.knocked_out, 0);
    assert_eq!(vanilla.tiers.boundary, 0);
    assert!(
        knock_out.price < vanilla.price,
        "knock-out {} vs vanilla {}",
        knock_out.price,
        vanilla.price
    );
}

#[test]
fn test_results_independent_of_thread_count() {
    let run = |threads| {
        let config = McConfig {
            paths: 4_000,
            seed: 777,
            threads: Some(threads),
            ..Default::default()
        };
        price_barrier_swaption(ModelParameters::default(), config).expect("Valid configuration")
    };
    let single = run(1);
    let multi = run(4);

    assert_eq!(single.price, multi.price);
    assert_eq!(single.std_error, multi.std_error);
    assert_eq!(single.mean_exit_time, multi.mean_exit_time);
    assert_eq!(single.knocked_out, multi.knocked_out);
    assert_eq!(single.tiers, multi.tiers);
}

#[test]
fn test_seed_changes_estimate() {
    let run = |seed| {
        let config = McConfig {
            paths: 2_000,
            seed,
            ..Default::default()
        };
        price_barrier_swaption(ModelParameters::default(), config).expect("Valid configuration")
    };
    assert_ne!(run(1).price, run(2).price);
}

#[test]
fn test_gaussian_and_discrete_shocks_agree() {
    let run = |scheme| {
        let config = McConfig {
            paths: 20_000,
            scheme,
            ..Default::default()
        };
        price_barrier_swaption(ModelParameters::default(), config).expect("Valid configuration")
    };
    let discrete = run(ShockScheme::Discrete);
    let gaussian = run(ShockScheme::Gaussian);

    println!(
        "\nDiscrete: {:.6} ± {:.6}, Gaussian: {:.6} ± {:.6}",
        discrete.price, discrete.std_error, gaussian.price, gaussian.std_error
    );
    let combined = (discrete.std_error.powi(2) + gaussian.std_error.powi(2)).sqrt();
    assert!((discrete.price - gaussian.price).abs() < 4.0 * combined);
}

#[test]
fn test_projection_methods_give_same_price() {
    let run = |projection| {
        let config = McConfig {
            paths: 3_000,
            projection,
            ..Default::default()
        };
        price_barrier_swaption(ModelParameters::default(), config).expect("Valid configuration")
    };
    let reduced = run(ProjectionMethod::Reduced);
    let constrained = run(ProjectionMethod::Constrained);
    assert!((reduced.price - constrained.price).abs() < 5e-4);
}

#[test]
fn test_zero_volatility_is_deterministic() {
    let params = ModelParameters {
        volatilities: vec![0.0; 10],
        ..Default::default()
    };
    let config = McConfig {
        paths: 500,
        ..Default::default()
    };
    let result = price_barrier_swaption(params, config).expect("Valid configuration");

    let annuity: f64 = (1..=10).map(|i| 1.05f64.powi(-i)).sum();
    let expected = 0.04 * annuity / 1.05;
    assert!((result.price - expected).abs() < 1e-12);
    assert!(result.std_error < 1e-9);
    assert_eq!(result.knocked_out, 0);
    assert!((result.mean_exit_time - 10.0).abs() < 1e-12);
}

#[test]
fn test_breached_barrier_fails_before_simulation() {
    for barrier in [0.0499, 0.03] {
        let params = ModelParameters {
            barrier,
            ..Default::default()
        };
        let err = MonteCarloEngine::new(params, McConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, LmmError::BarrierBreached { .. }));
    }
}

#[test]
fn test_projection_failure_aborts_run() {
    let config = McConfig {
        paths: 2_000,
        projection_options: ProjectionOptions {
            max_iterations: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let err = price_barrier_swaption(ModelParameters::default(), config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Projection);
    match err {
        LmmError::ProjectionFailure { path, step, .. } => {
            assert!(path < 2_000);
            assert!(step < 100);
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn test_projection_failure_independent_of_thread_count() {
    let failure = |threads| {
        let config = McConfig {
            paths: 2_000,
            threads: Some(threads),
            projection_options: ProjectionOptions {
                max_iterations: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        match price_barrier_swaption(ModelParameters::default(), config) {
            Err(LmmError::ProjectionFailure { path, step, .. }) => (path, step),
            other => panic!("expected a projection failure, got {:?}", other.map(|r| r.price)),
        }
    };
    let (path, step) = failure(1);
    assert_eq!(failure(4), (path, step));

    // It is the first path that fails
    let engine = MonteCarloEngine::new(
        ModelParameters::default(),
        McConfig {
            projection_options: ProjectionOptions {
                max_iterations: 1,
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .expect("Valid configuration");
    assert!((0..path).all(|i| engine.simulate_path(i).is_ok()));
}

#[test]
fn test_finer_monitoring_stays_consistent() {
    // Price should move little when the monitoring grid is refined
    let run = |steps| {
        let params = ModelParameters {
            steps,
            ..Default::default()
        };
        let config = McConfig {
            paths: 10_000,
            ..Default::default()
        };
        price_barrier_swaption(params, config).expect("Valid configuration")
    };
    let coarse = run(50);
    let fine = run(200);
    println!("\nM = 50: {:.6}, M = 200: {:.6}", coarse.price, fine.price);
    assert!((coarse.price - fine.price).abs() < 0.05);
}
