//! Headless arena runner.
//!
//! Runs the arena without graphics, either driven by an external learner over
//! JSON lines or by a built-in strategy.
//!
//! # Usage
//!
//! ```bash
//! # Serve a scenario to a learner on stdin/stdout
//! cargo run -p arena_headless -- serve --scenario default --seed 7
//!
//! # Run a single game with a built-in strategy
//! cargo run -p arena_headless -- run --scenario duel --strategy greedy
//!
//! # Run a batch of seeds in parallel
//! cargo run -p arena_headless -- batch --scenario crowded --count 200 --output results/
//!
//! # Verify determinism
//! cargo run -p arena_headless -- verify --scenario duel --seed 12345 --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    protocol::{serve, Session},
    runner::{run_game_with_snapshots, RunOptions},
    scenario::Scenario,
    strategies::StrategyKind,
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless snake arena runner for training and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve an arena over JSON lines on stdin/stdout
    Serve {
        /// Preset name or scenario file
        #[arg(short, long, default_value = "default")]
        scenario: String,

        /// Arena seed (defaults to the scenario's configured seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a single game with a built-in strategy
    Run {
        /// Preset name or scenario file
        #[arg(short, long, default_value = "default")]
        scenario: String,

        /// Arena seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Ticks to simulate (defaults to the scenario's tick count)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Strategy override
        #[arg(long, value_enum)]
        strategy: Option<StrategyKind>,

        /// Write JSON-lines snapshots to this file
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Ticks between snapshots
        #[arg(long, default_value = "100")]
        snapshot_every: u64,
    },

    /// Run a batch of seeds in parallel
    Batch {
        /// Preset name or scenario file
        #[arg(short, long, default_value = "default")]
        scenario: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Ticks per game (defaults to the scenario's tick count)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Strategy override
        #[arg(long, value_enum)]
        strategy: Option<StrategyKind>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Preset name or scenario file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run (defaults to the scenario's tick count)
        #[arg(short, long)]
        ticks: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Serve { scenario, seed }) => cmd_serve(&scenario, seed),
        Some(Commands::Run {
            scenario,
            seed,
            ticks,
            strategy,
            snapshots,
            snapshot_every,
        }) => cmd_run(&scenario, seed, ticks, strategy, snapshots, snapshot_every),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            ticks,
            strategy,
        }) => cmd_batch(&scenario, count, parallel, output, seed, ticks, strategy),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            ticks,
        }) => cmd_verify(&scenario, seed, runs, ticks),
        None => {
            // Default: serve the default scenario
            cmd_serve("default", None);
        }
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => {
            tracing::info!(scenario = %scenario.name, "Loaded scenario");
            scenario
        }
        Err(e) => {
            eprintln!("Failed to load scenario '{name}': {e}");
            eprintln!("Built-in scenarios: {}", Scenario::PRESETS.join(", "));
            std::process::exit(1);
        }
    }
}

/// Serve an arena to an external learner
fn cmd_serve(scenario: &str, seed: Option<u64>) {
    let scenario = load_scenario(scenario);
    let seed = seed.unwrap_or(scenario.arena.seed);
    let arena = match scenario.build_arena(seed) {
        Ok(arena) => arena,
        Err(e) => {
            eprintln!("Failed to build arena: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(seed, agents = arena.snakes().len(), "Starting session");
    let mut session = Session::new(arena);
    let stdin = io::stdin();
    let stdout = io::stdout();
    match serve(&mut session, stdin.lock(), stdout.lock()) {
        Ok(processed) => tracing::info!(processed, "Session closed"),
        Err(e) => {
            tracing::error!(error = %e, "Session failed");
            std::process::exit(1);
        }
    }
}

/// Run a single game
fn cmd_run(
    scenario: &str,
    seed: u64,
    ticks: Option<u64>,
    strategy: Option<StrategyKind>,
    snapshots: Option<PathBuf>,
    snapshot_every: u64,
) {
    let scenario = load_scenario(scenario);
    let options = RunOptions {
        seed,
        ticks,
        strategy,
        snapshot_every: if snapshots.is_some() { snapshot_every } else { 0 },
    };

    let result = match snapshots {
        Some(path) => match File::create(&path) {
            Ok(file) => {
                run_game_with_snapshots(&scenario, &options, &mut BufWriter::new(file))
            }
            Err(e) => {
                eprintln!("Cannot create snapshot file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => run_game_with_snapshots(&scenario, &options, &mut io::sink()),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Game failed: {e}");
            std::process::exit(1);
        }
    };

    eprintln!(
        "Game complete: {} ticks in {:.2}s, hash {:016x}",
        summary.ticks, summary.duration_seconds, summary.final_hash
    );
    for team in &summary.teams {
        eprintln!(
            "  {:<20} record {:>4}  food {:>5}  deaths {:>5}  kills {:>4}  reward {:>10.1}",
            team.name, team.record, team.food, team.deaths, team.kills, team.total_reward
        );
    }
    match serde_json::to_string(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode summary: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a batch of games
fn cmd_batch(
    scenario: &str,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    ticks: Option<u64>,
    strategy: Option<StrategyKind>,
) {
    let scenario = load_scenario(scenario);

    tracing::info!(
        scenario = %scenario.name,
        count,
        parallel,
        seed,
        output = %output.display(),
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig {
        game_count: count,
        parallel_games: parallel,
        seed_start: seed,
        ticks,
        strategy,
        output_dir: output.clone(),
    };
    let results = run_batch(&scenario, config);

    let path = output.join(format!("{}_batch.json", scenario.name));
    if let Err(e) = results.save(&path) {
        eprintln!("Failed to save results to '{}': {}", path.display(), e);
        std::process::exit(1);
    }

    eprintln!(
        "Batch complete: {} games, {} errors, {:.1}s",
        results.games.len(),
        results.errors.len(),
        results.duration_seconds
    );
    for team in &results.summary.teams {
        eprintln!(
            "  {:<20} mean record {:>6.2}  best {:>4}  mean deaths {:>7.1}  mean food {:>7.1}",
            team.name, team.mean_record, team.best_record, team.mean_deaths, team.mean_food
        );
    }
    eprintln!("Results written to {}", path.display());

    if !results.errors.is_empty() {
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32, ticks: Option<u64>) {
    let scenario = load_scenario(scenario);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    let report = match verify_determinism(&scenario, seed, runs, ticks) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Verification run failed: {e}");
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = report.hashes.first() {
            eprintln!("  Final hash: {hash:016x}");
        }
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (i, hash) in report.hashes.iter().enumerate() {
            eprintln!("  Run {i}: {hash:016x}");
        }
        std::process::exit(1);
    }
}
