//! Batch game runner.
//!
//! Runs many seeded games in parallel using rayon and aggregates per-team
//! results. Each game owns its arena, so games never share state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::runner::{run_game, GameSummary, RunOptions};
use crate::scenario::Scenario;
use crate::strategies::StrategyKind;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run.
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick override per game.
    pub ticks: Option<u64>,
    /// Strategy override.
    pub strategy: Option<StrategyKind>,
    /// Output directory for results.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            ticks: None,
            strategy: None,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` games with default settings.
    #[must_use]
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick count per game.
    #[must_use]
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = Some(ticks);
        self
    }
}

/// A game that failed to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Per-team aggregate over a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    /// Team name.
    pub name: String,
    /// Mean record across games.
    pub mean_record: f64,
    /// Best record in any game.
    pub best_record: u32,
    /// Mean deaths per game.
    pub mean_deaths: f64,
    /// Mean food per game.
    pub mean_food: f64,
    /// Mean total reward per game.
    pub mean_reward: f64,
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games aggregated.
    pub games: usize,
    /// Per-team aggregates, in configuration order.
    pub teams: Vec<TeamAggregate>,
}

impl BatchSummary {
    /// Aggregate a set of games from the same scenario.
    #[must_use]
    pub fn from_games(games: &[GameSummary]) -> Self {
        let Some(first) = games.first() else {
            return Self::default();
        };
        let n = games.len() as f64;
        let teams = first
            .teams
            .iter()
            .enumerate()
            .map(|(i, team)| {
                let results = games.iter().filter_map(|g| g.teams.get(i));
                let mut aggregate = TeamAggregate {
                    name: team.name.clone(),
                    mean_record: 0.0,
                    best_record: 0,
                    mean_deaths: 0.0,
                    mean_food: 0.0,
                    mean_reward: 0.0,
                };
                for result in results {
                    aggregate.mean_record += f64::from(result.record);
                    aggregate.best_record = aggregate.best_record.max(result.record);
                    aggregate.mean_deaths += result.deaths as f64;
                    aggregate.mean_food += result.food as f64;
                    aggregate.mean_reward += result.total_reward;
                }
                aggregate.mean_record /= n;
                aggregate.mean_deaths /= n;
                aggregate.mean_food /= n;
                aggregate.mean_reward /= n;
                aggregate
            })
            .collect();
        Self {
            games: games.len(),
            teams,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual games, ordered by seed.
    pub games: Vec<GameSummary>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a pretty JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

fn run_seed(scenario: &Scenario, config: &BatchConfig, seed: u64) -> Result<GameSummary, BatchError> {
    let options = RunOptions {
        seed,
        ticks: config.ticks,
        strategy: config.strategy,
        snapshot_every: 0,
    };
    run_game(scenario, &options).map_err(|e| BatchError {
        seed,
        message: e.to_string(),
    })
}

/// Run a batch of games.
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} games of '{}'",
        config.game_count, scenario.name
    );

    let run_all = || -> Vec<Result<GameSummary, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let result = run_seed(scenario, &config, seed);
                match &result {
                    Ok(_) => {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % 10 == 0 {
                            debug!("Progress: {}/{}", done, config.game_count);
                        }
                    }
                    Err(e) => warn!(seed, error = %e.message, "Game failed"),
                }
                result
            })
            .collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global pool");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let mut games = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(game) => games.push(game),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Seed replayed.
    pub seed: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
}

impl DeterminismReport {
    /// Whether every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Replay one seed `runs` times and collect the final hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    seed: u64,
    runs: u32,
    ticks: Option<u64>,
) -> Result<DeterminismReport, crate::runner::RunError> {
    let options = RunOptions {
        seed,
        ticks,
        ..RunOptions::default()
    };
    let hashes = (0..runs)
        .map(|_| run_game(scenario, &options).map(|summary| summary.final_hash))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DeterminismReport { seed, hashes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_runs_every_seed() {
        let config = BatchConfig::new(6).with_seed(100).with_ticks(100);
        let results = run_batch(&Scenario::duel(), config);
        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (100..106).collect::<Vec<_>>());
        assert_eq!(results.summary.games, 6);
        assert_eq!(results.summary.teams.len(), 2);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let scenario = Scenario::duel();
        let config = BatchConfig {
            parallel_games: 2,
            ..BatchConfig::new(4).with_ticks(80)
        };
        let results = run_batch(&scenario, config);
        for game in &results.games {
            let solo = run_game(
                &scenario,
                &RunOptions {
                    ticks: Some(80),
                    ..RunOptions::seeded(game.seed)
                },
            )
            .unwrap();
            assert_eq!(solo.final_hash, game.final_hash);
        }
    }

    #[test]
    fn test_summary_of_nothing() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&Scenario::duel(), 12345, 3, Some(150)).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("batch.json");
        let results = run_batch(&Scenario::duel(), BatchConfig::new(2).with_ticks(20));
        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games.len(), 2);
        assert_eq!(loaded.scenario, "duel");
        assert_eq!(loaded.summary.teams.len(), results.summary.teams.len());
        assert_eq!(loaded.games[1].final_hash, results.games[1].final_hash);
    }
}
