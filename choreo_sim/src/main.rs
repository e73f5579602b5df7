//! Choreo Scenario Runner CLI
//!
//! Plays choreographies through the engine and checks that advancing the
//! clock and seeking to the same time always agree.

use choreo_core::{EngineConfig, Scenario};
use choreo_sim::scenarios::{read_scenario, write_scenario, ScenarioId};
use choreo_sim::{ScenarioResult, ScenarioRunner};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Choreo deterministic scenario runner
#[derive(Parser, Debug)]
#[command(name = "choreo-sim")]
#[command(about = "Run message choreographies through the Choreo engine", long_about = None)]
struct Args {
    /// Seed for generated scenarios (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (ping_pong, tcp_handshake, tls_handshake, gossip, random, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Frames per second; each frame advances 1000/tick_rate time units
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Engine speed multiplier (default 1.0; overrides the speed in --config)
    #[arg(long)]
    speed: Option<f64>,

    /// Virtual time budget per run
    #[arg(short, long, default_value = "600000")]
    duration: f64,

    /// Engine config (JSON: radius, center, speed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a scenario file instead of the built-ins
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the selected scenario definition to a file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Export sampled frames to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Ticks between exported frames
    #[arg(long, default_value = "6")]
    export_interval: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn load_config(path: &Path) -> EngineConfig {
    let payload = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path.display(), e)));
    serde_json::from_str(&payload)
        .unwrap_or_else(|e| fail(format!("bad config {}: {}", path.display(), e)))
}

/// Config file values, with an explicit `--speed` taking precedence.
fn engine_config(file: Option<EngineConfig>, speed: Option<f64>) -> EngineConfig {
    let mut config = file.unwrap_or_default();
    if let Some(speed) = speed {
        config.speed = speed;
    }
    config
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Choreo Scenario Runner v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = engine_config(args.config.as_deref().map(load_config), args.speed);

    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // A loaded file replaces the built-in selection
    let selection: Vec<(String, Option<ScenarioId>, Option<Scenario>)> = match &args.load {
        Some(path) => {
            let scenario = read_scenario(path)
                .unwrap_or_else(|e| fail(format!("cannot load {}: {}", path.display(), e)));
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom".to_string());
            vec![(name, None, Some(scenario))]
        }
        None if args.scenario == "all" => ScenarioId::all()
            .into_iter()
            .map(|id| (id.name().to_string(), Some(id), None))
            .collect(),
        None => {
            let id: ScenarioId = args.scenario.parse().unwrap_or_else(|e| {
                eprintln!("Available scenarios: ping_pong, tcp_handshake, tls_handshake, gossip, random, all");
                fail(e)
            });
            vec![(id.name().to_string(), Some(id), None)]
        }
    };

    let single = selection.len() == 1;
    if (args.save.is_some() || args.export.is_some()) && !single {
        fail("--save and --export need a single scenario, not 'all'");
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();

    for seed_offset in 0..args.seeds.max(1) {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed)
            .with_tick_rate(args.tick_rate)
            .with_speed(config.speed)
            .with_duration(args.duration)
            .with_config(config.clone());

        for (name, id, loaded) in &selection {
            let definition = match (loaded, id) {
                (Some(scenario), _) => scenario.clone(),
                (None, Some(id)) => id
                    .build(seed)
                    .unwrap_or_else(|e| fail(format!("cannot build {}: {}", name, e))),
                (None, None) => continue,
            };

            if let Some(path) = &args.save {
                match write_scenario(path, &definition) {
                    Ok(()) => info!("Saved {} to {}", name, path.display()),
                    Err(e) => error!("Failed to save {}: {}", name, e),
                }
            }

            let result = match &args.export {
                Some(path) => {
                    let (result, export) =
                        runner.run_with_export(name, &definition, args.export_interval);
                    if let Err(e) = export.write_to_file(path) {
                        error!("Failed to write export: {:?}", e);
                    } else {
                        info!("Exported {} frames to {}", export.frames.len(), path.display());
                    }
                    result
                }
                None => runner.run_scenario(name, &definition),
            };

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED  t={:.0} ticks={} activations={} skipped={}",
                        name,
                        seed,
                        result.final_time,
                        result.total_ticks,
                        result.metrics.activations,
                        result.metrics.skipped
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        name,
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario,
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
