// scripts/benchmark.rs
use lmm_barrier::analytics::swap_market::{
    AnalyticReference, ReferenceInputs, SwapMarketApproximation,
};
use lmm_barrier::mc::mc_engine::{AggregateResult, McConfig, MonteCarloEngine};
use lmm_barrier::models::params::ModelParameters;
use lmm_barrier::solvers::lmm_step::ShockScheme;
use lmm_barrier::solvers::projection::ProjectionMethod;
use std::env;
use std::fs::File;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    result: AggregateResult,
    throughput_paths_per_sec: f64,
    reference: Option<f64>,
}

impl BenchmarkResult {
    fn new(name: String, result: AggregateResult, reference: Option<f64>) -> Self {
        let throughput_paths_per_sec = result.paths as f64 / (result.elapsed_ms / 1000.0);
        Self {
            name,
            result,
            throughput_paths_per_sec,
            reference,
        }
    }
}

fn run_reference_case(paths: usize, reference: f64) -> Vec<BenchmarkResult> {
    let variants = [
        (ShockScheme::Discrete, ProjectionMethod::Reduced),
        (ShockScheme::Gaussian, ProjectionMethod::Reduced),
        (ShockScheme::Discrete, ProjectionMethod::Constrained),
    ];

    let mut results = Vec::new();
    for (scheme, projection) in variants {
        let name = format!("{} shocks / {} projection", scheme.name(), projection.name());
        println!("Running {} with {} paths...", name, paths);

        let config = McConfig {
            paths,
            scheme,
            projection,
            ..Default::default()
        };
        match MonteCarloEngine::new(ModelParameters::default(), config).and_then(|e| e.run()) {
            Ok(result) => results.push(BenchmarkResult::new(name, result, Some(reference))),
            Err(e) => eprintln!("  {} failed: {}", name, e),
        }
    }
    results
}

fn run_thread_scaling(paths: usize) -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let mut threads = 1;
    while threads <= num_cpus::get() {
        println!("Running reference case on {} threads...", threads);
        let config = McConfig {
            paths,
            threads: Some(threads),
            ..Default::default()
        };
        match MonteCarloEngine::new(ModelParameters::default(), config).and_then(|e| e.run()) {
            Ok(result) => results.push(BenchmarkResult::new(
                format!("{} threads", threads),
                result,
                None,
            )),
            Err(e) => eprintln!("  {} threads failed: {}", threads, e),
        }
        threads *= 2;
    }
    results
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    system_info: &SystemInfo,
    filename: &str,
) -> io::Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;

    writeln!(
        file,
        "Benchmark,Paths,Time_ms,Throughput_paths_per_sec,Price,Std_Error,Mean_Exit_Time,\
         Knocked_Out,Coarse_Steps,Fine_Steps,Boundary_Steps,Reference"
    )?;
    for b in results {
        let r = &b.result;
        writeln!(
            file,
            "{},{},{:.2},{:.0},{:.6},{:.6},{:.4},{},{},{},{},{}",
            b.name,
            r.paths,
            r.elapsed_ms,
            b.throughput_paths_per_sec,
            r.price,
            r.std_error,
            r.mean_exit_time,
            r.knocked_out,
            r.tiers.coarse,
            r.tiers.fine,
            r.tiers.boundary,
            b.reference
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "N/A".to_string())
        )?;
    }

    println!("Results written to {}", filename);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("lmm-barrier Benchmark Suite");
    println!("===========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let paths: usize = env::args()
        .nth(1)
        .and_then(|a| a.parse().ok())
        .unwrap_or(100_000);

    let params = ModelParameters::default();
    let model = SwapMarketApproximation::new();
    let inputs = ReferenceInputs::from_params(&params).expect("Valid reference parameters");
    let reference = model.reference_price(&inputs).expect("Reference price");
    let vanilla = model.vanilla_price(&inputs).expect("Vanilla price");
    println!("Swap Market Model reference: {:.6} (vanilla {:.6})\n", reference, vanilla);

    let mut results = run_reference_case(paths, reference);
    results.extend(run_thread_scaling(paths / 4));

    println!(
        "\n{:<40} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Benchmark", "Price", "Std Err", "Exit", "Survival", "Time (ms)"
    );
    println!("{}", "-".repeat(97));
    for b in &results {
        let r = &b.result;
        println!(
            "{:<40} {:>10.6} {:>10.6} {:>10.4} {:>10.4} {:>12.1}",
            b.name,
            r.price,
            r.std_error,
            r.mean_exit_time,
            r.survival_rate(),
            r.elapsed_ms
        );
    }
    println!();

    let filename = format!(
        "benchmark_results_{}.csv",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    if let Err(e) = write_results_to_csv(&results, &system_info, &filename) {
        eprintln!("Could not write {}: {}", filename, e);
    }
}
