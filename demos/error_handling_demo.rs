// demos/error_handling_demo.rs
use lmm_barrier::error::{ErrorKind, LmmError};
use lmm_barrier::mc::mc_engine::{price_barrier_swaption, McConfig, MonteCarloEngine};
use lmm_barrier::models::correlation::CorrelationModel;
use lmm_barrier::models::params::ModelParameters;
use lmm_barrier::solvers::projection::ProjectionOptions;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Error Handling Demo for lmm-barrier");
    println!("===================================\n");

    // Test 1: Barrier already breached by the initial curve
    println!("1. Testing a barrier below the initial swap rate...");
    let breached = ModelParameters {
        barrier: 0.045,
        ..Default::default()
    };
    match MonteCarloEngine::new(breached, McConfig::default()) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 2: Negative forward rate
    println!("\n2. Testing a negative initial forward...");
    let mut negative = ModelParameters::default();
    negative.initial_forwards[4] = -0.01;
    match negative.validate() {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 3: Mismatched volatility vector
    println!("\n3. Testing mismatched volatilities...");
    let mismatched = ModelParameters {
        volatilities: vec![0.1; 7],
        ..Default::default()
    };
    match mismatched.validate() {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 4: Perfectly correlated forwards
    println!("\n4. Testing a singular correlation matrix (β = 0)...");
    let singular = ModelParameters {
        beta: 0.0,
        ..Default::default()
    };
    match CorrelationModel::new(&singular) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 5: Invalid Monte Carlo configuration
    println!("\n5. Testing invalid Monte Carlo configuration...");
    let invalid_config = McConfig {
        paths: 0,
        ..Default::default()
    };
    match price_barrier_swaption(ModelParameters::default(), invalid_config) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 6: A projector with no iterations to spare aborts the run
    println!("\n6. Testing a projection failure...");
    let starved = McConfig {
        paths: 1_000,
        projection_options: ProjectionOptions {
            max_iterations: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    match price_barrier_swaption(ModelParameters::default(), starved) {
        Ok(r) => println!("   Projection converged anyway: price = {:.4}", r.price),
        Err(e @ LmmError::ProjectionFailure { .. }) => {
            println!("   ✓ Caught {:?} error: {}", e.kind(), e)
        }
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    // Test 7: Valid configuration should work
    println!("\n7. Testing valid configuration...");
    let valid = McConfig {
        paths: 10_000,
        ..Default::default()
    };
    match price_barrier_swaption(ModelParameters::default(), valid) {
        Ok(r) => println!(
            "   ✓ Success: Price = {:.4} ± {:.4}, mean exit = {:.2}",
            r.price, r.std_error, r.mean_exit_time
        ),
        Err(e) => println!("   Unexpected error: {}", e),
    }

    // Test 8: Error type matching
    println!("\n8. Testing error type matching...");
    let zero_tenor = ModelParameters {
        tenor: 0.0,
        ..Default::default()
    };
    match zero_tenor.validate() {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) if e.kind() == ErrorKind::Configuration => match e {
            LmmError::InvalidParameters {
                parameter,
                value,
                constraint,
            } => println!("   ✓ Caught InvalidParameters: {} = {} ({})", parameter, value, constraint),
            other => println!("   ✓ Caught configuration error: {}", other),
        },
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    println!("\n✓ Error handling demo complete!");
    println!("All error cases were properly caught and handled.");
}
