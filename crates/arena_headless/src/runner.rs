//! Single-game execution.
//!
//! Runs one scenario for its tick count with a built-in strategy, folds the
//! per-tick events into a [`GameSummary`] and optionally streams snapshots as
//! JSON lines.

use std::io::Write;
use std::result::Result;
use std::time::Instant;

use arena_core::analytics::CauseCounts;
use arena_core::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::scenario::{Scenario, ScenarioError};
use crate::strategies::{collect_actions, StrategyKind};

/// Error type for game runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// Scenario could not be turned into an arena.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The engine rejected a step.
    #[error("Simulation error: {0}")]
    Arena(#[from] ArenaError),
    /// Writing snapshots failed.
    #[error("Failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding snapshots failed.
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Options for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Arena seed.
    pub seed: u64,
    /// Ticks to simulate. `None` uses the scenario's tick count.
    pub ticks: Option<u64>,
    /// Strategy override. `None` uses the scenario's strategy.
    pub strategy: Option<StrategyKind>,
    /// Write a snapshot every this many ticks (0 disables).
    pub snapshot_every: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            ticks: None,
            strategy: None,
            snapshot_every: 0,
        }
    }
}

impl RunOptions {
    /// Options for `seed` with everything else taken from the scenario.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// One team's totals over a whole game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamResult {
    /// Team name.
    pub name: String,
    /// Best score reached.
    pub record: u32,
    /// Deaths.
    pub deaths: u64,
    /// Food eaten.
    pub food: u64,
    /// Kill credits.
    pub kills: u64,
    /// Sum of all rewards paid to the team's agents.
    pub total_reward: f64,
}

/// Outcome of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed the arena was built with.
    pub seed: u64,
    /// Strategy that drove every agent.
    pub strategy: StrategyKind,
    /// Ticks simulated.
    pub ticks: u64,
    /// Per-team totals, in configuration order.
    pub teams: Vec<TeamResult>,
    /// Deaths across all teams, by cause.
    pub causes: CauseCounts,
    /// Closed analytics intervals.
    pub intervals: Vec<IntervalSummary>,
    /// State hash after the last tick.
    pub final_hash: u64,
    /// Wall-clock duration.
    pub duration_seconds: f64,
}

/// Folds tick events into game totals.
#[derive(Debug)]
struct GameRecorder {
    intervals: IntervalStats,
    summaries: Vec<IntervalSummary>,
    food: Vec<u64>,
    kills: Vec<u64>,
    causes: CauseCounts,
    team_of: Vec<usize>,
}

impl GameRecorder {
    fn new(arena: &Arena) -> Self {
        let names = arena.config().teams.iter().map(|t| t.name.clone()).collect();
        let teams = arena.config().teams.len();
        Self {
            intervals: IntervalStats::new(names, arena.config().stats_interval),
            summaries: Vec::new(),
            food: vec![0; teams],
            kills: vec![0; teams],
            causes: CauseCounts::default(),
            team_of: arena.snakes().iter().map(|s| s.team).collect(),
        }
    }
}

impl AnalyticsSink for GameRecorder {
    fn on_tick(&mut self, events: &TickEvents) {
        for meal in &events.food {
            self.food[meal.team] += 1;
        }
        for kill in &events.kills {
            if let Some(&team) = self.team_of.get(kill.killer) {
                self.kills[team] += 1;
            }
        }
        for death in &events.deaths {
            self.causes.record(death.cause);
        }
        if let Some(summary) = self.intervals.observe(events) {
            for team in &summary.teams {
                info!(
                    tick = summary.tick,
                    team = %team.team,
                    food = team.food,
                    deaths = team.deaths,
                    ratio = team.food_death_ratio(),
                    "Interval summary"
                );
            }
            self.summaries.push(summary);
        }
    }
}

/// Run a scenario to completion.
pub fn run_game(scenario: &Scenario, options: &RunOptions) -> Result<GameSummary, RunError> {
    run_game_with_snapshots(scenario, options, &mut std::io::sink())
}

/// Run a scenario, writing a JSON-lines [`GameState`] to `out` every
/// `options.snapshot_every` ticks.
pub fn run_game_with_snapshots<W: Write>(
    scenario: &Scenario,
    options: &RunOptions,
    out: &mut W,
) -> Result<GameSummary, RunError> {
    let started = Instant::now();
    let ticks = options.ticks.unwrap_or(scenario.ticks);
    let strategy = options.strategy.unwrap_or(scenario.strategy);

    let mut arena = scenario.build_arena(options.seed)?;
    let mut policies = strategy.build_all(arena.snakes().len(), options.seed);
    let mut recorder = GameRecorder::new(&arena);
    let mut rewards = vec![0.0f64; arena.config().teams.len()];

    debug!(
        scenario = %scenario.name,
        seed = options.seed,
        ticks,
        strategy = %strategy,
        agents = arena.snakes().len(),
        "Starting game"
    );

    for _ in 0..ticks {
        let actions = collect_actions(&mut policies, &arena);
        let results = arena.step(&actions)?;
        for (snake, result) in arena.snakes().iter().zip(&results) {
            rewards[snake.team] += f64::from(result.reward);
        }
        recorder.on_tick(arena.last_events());

        if options.snapshot_every > 0 && arena.tick() % options.snapshot_every == 0 {
            serde_json::to_writer(&mut *out, &arena.snapshot())?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    let teams = arena
        .team_stats()
        .iter()
        .enumerate()
        .map(|(i, stats)| TeamResult {
            name: stats.name.clone(),
            record: stats.record,
            deaths: stats.deaths,
            food: recorder.food[i],
            kills: recorder.kills[i],
            total_reward: rewards[i],
        })
        .collect();

    let summary = GameSummary {
        scenario: scenario.name.clone(),
        seed: options.seed,
        strategy,
        ticks: arena.tick(),
        teams,
        causes: recorder.causes,
        intervals: recorder.summaries,
        final_hash: arena.state_hash(),
        duration_seconds: started.elapsed().as_secs_f64(),
    };

    debug!(
        seed = options.seed,
        hash = %format!("{:016x}", summary.final_hash),
        "Game complete"
    );
    Ok(summary)
}
