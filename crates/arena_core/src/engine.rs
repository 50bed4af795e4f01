//! Turn stepper.
//!
//! [`Arena`] owns the whole simulation: grid, registry, managers, counters
//! and the RNG. Each call to [`Arena::step`] consumes one direction per
//! agent and resolves agents one at a time in ascending slot order.
//!
//! # Slot order
//!
//! Slot order is part of the public contract. An agent sees everything the
//! agents before it have already committed in the same tick, so when two
//! snakes head for the same empty cell the lower slot gets there first and
//! the higher slot runs into it.
//!
//! # Per-agent algorithm
//!
//! 1. A snake that is still dead (an earlier respawn found no room) is
//!    respawned and reports a terminal no-op. A snake killed earlier this
//!    tick by another agent forfeits its move.
//! 2. Distances to the nearest food, enemy and ally are recorded.
//! 3. Hunger removes `hunger_decay` hp.
//! 4. The action updates the heading (reversals are ignored) and the next
//!    head is predicted.
//! 5. A snake with no hp left starves in place and skips the move.
//!    Otherwise the move is classified: wall, food, body contact or clear.
//! 6. The outcome is applied.
//! 7. A snake left with no hp, or past `starvation_steps` without a meal,
//!    starves.
//! 8. Deaths are counted, reported and respawned immediately.
//! 9. Distances are measured again and the reward is shaped, plus any
//!    pending reward staged by combat.
//!
//! After every agent has moved, team scores and records are refreshed and
//! food is topped up.
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//!
//! let mut arena = Arena::new(ArenaConfig::default()).unwrap();
//! let actions: Vec<Direction> = arena.snakes().iter().map(|s| s.direction).collect();
//! let results = arena.step(&actions).unwrap();
//! assert_eq!(results.len(), 4);
//! assert_eq!(arena.tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::analytics::{DeathEvent, FoodEvent, KillEvent, RespawnEvent, TickEvents};
use crate::combat::{classify, resolve_encounter, MoveOutcome};
use crate::config::{ArenaConfig, ScoreMetric};
use crate::error::{ArenaError, Result};
use crate::food::FoodManager;
use crate::grid::{Direction, Grid, Point, RelativeTurn};
use crate::registry::EntityRegistry;
use crate::respawn::RespawnManager;
use crate::reward::{RewardShaper, TickOutcome};
use crate::rng::ArenaRng;
use crate::snake::{DeathCause, SlotId, Snake};
use crate::snapshot::{GameState, SnakeView};
use crate::stats::{Clock, GlobalStats, TeamStats};

/// Per-agent result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Shaped reward, including pending combat rewards.
    pub reward: f32,
    /// Whether the agent died this tick.
    pub done: bool,
    /// Score at the end of the move (before any respawn).
    pub score: u32,
}

/// The snake arena simulation.
#[derive(Debug, Clone)]
pub struct Arena {
    config: ArenaConfig,
    grid: Grid,
    registry: EntityRegistry,
    rng: ArenaRng,
    food: FoodManager,
    respawn: RespawnManager,
    shaper: RewardShaper,
    teams: Vec<TeamStats>,
    total_deaths: u64,
    tick: u64,
    clock: Clock,
    events: TickEvents,
}

impl Arena {
    /// Build an arena seeded from `config.seed`.
    pub fn new(config: ArenaConfig) -> Result<Self> {
        let seed = config.seed;
        Self::with_seed(config, seed)
    }

    /// Build an arena with an explicit seed.
    ///
    /// Validates the configuration, spawns every agent and places the
    /// initial food.
    pub fn with_seed(config: ArenaConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut snakes = Vec::with_capacity(config.agent_count());
        for (team_index, team) in config.teams.iter().enumerate() {
            for i in 0..team.count {
                let role = team.role_of(i);
                snakes.push(Snake::new(
                    snakes.len(),
                    team_index,
                    role,
                    team.reward_mode,
                    config.role(role),
                ));
            }
        }

        let mut arena = Self {
            grid: config.grid(),
            registry: EntityRegistry::new(snakes),
            rng: ArenaRng::new(seed),
            food: FoodManager::new(config.food_count, config.food_attempts),
            respawn: RespawnManager::new(config.initial_length, config.respawn_attempts),
            shaper: RewardShaper::new(config.cell_size),
            teams: config.teams.iter().map(|t| TeamStats::new(&t.name)).collect(),
            total_deaths: 0,
            tick: 0,
            clock: Clock::start(),
            events: TickEvents::default(),
            config,
        };

        for slot in 0..arena.registry.len() {
            if !arena.respawn_slot(slot) {
                return Err(ArenaError::SpawnExhausted(slot));
            }
        }
        arena.food.replenish(&arena.grid, &mut arena.registry, &mut arena.rng);
        arena.events = TickEvents::default();

        tracing::debug!(
            agents = arena.registry.len(),
            teams = arena.teams.len(),
            seed,
            "Arena created"
        );
        Ok(arena)
    }

    /// Rebuild from the same configuration. `None` keeps the current seed.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<()> {
        let seed = seed.unwrap_or_else(|| self.rng.seed());
        *self = Self::with_seed(self.config.clone(), seed)?;
        Ok(())
    }

    /// Advance one tick with one absolute direction per agent, in slot order.
    pub fn step(&mut self, actions: &[Direction]) -> Result<Vec<StepResult>> {
        let agents = self.registry.len();
        if actions.len() != agents {
            return Err(ArenaError::ActionCountMismatch {
                expected: agents,
                actual: actions.len(),
            });
        }

        self.events = TickEvents::default();
        let mut died = vec![false; agents];
        let mut results = Vec::with_capacity(agents);
        for (slot, &action) in actions.iter().enumerate() {
            results.push(self.step_agent(slot, action, &mut died));
        }
        // Agents resolved before they were killed still report the death.
        for (result, &dead) in results.iter_mut().zip(&died) {
            result.done |= dead;
        }

        self.refresh_team_scores();
        self.food
            .replenish(&self.grid, &mut self.registry, &mut self.rng);
        self.tick += 1;
        self.events.tick = self.tick;

        #[cfg(feature = "debug-validation")]
        self.check_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Arena state hash");
        }

        Ok(results)
    }

    /// Advance one tick with one relative turn per agent.
    pub fn step_relative(&mut self, turns: &[RelativeTurn]) -> Result<Vec<StepResult>> {
        if turns.len() != self.registry.len() {
            return Err(ArenaError::ActionCountMismatch {
                expected: self.registry.len(),
                actual: turns.len(),
            });
        }
        let actions: Vec<Direction> = self
            .registry
            .snakes()
            .iter()
            .zip(turns)
            .map(|(snake, &turn)| snake.direction.turned(turn))
            .collect();
        self.step(&actions)
    }

    fn step_agent(&mut self, slot: SlotId, action: Direction, died: &mut [bool]) -> StepResult {
        let snake = &self.registry[slot];
        let Some(head) = snake.head().filter(|_| snake.is_alive) else {
            let carried = std::mem::take(&mut self.registry[slot].pending_reward);
            self.respawn_slot(slot);
            return StepResult {
                reward: carried,
                done: true,
                score: 0,
            };
        };
        if died[slot] {
            let snake = &mut self.registry[slot];
            return StepResult {
                reward: std::mem::take(&mut snake.pending_reward),
                done: true,
                score: snake.score,
            };
        }

        let before = self.registry.distances(&self.grid, slot);

        let decay = self.config.hunger_decay;
        let snake = &mut self.registry[slot];
        snake.health.apply_damage(decay);
        snake.steps_since_meal = snake.steps_since_meal.saturating_add(1);
        snake.set_direction(action);
        let new_head = snake.predicted_head().unwrap_or(head);
        let (role, mode) = (snake.role, snake.reward_mode);
        let starved = snake.health.is_dead();

        // A snake starved by hunger dies where it stands, before any contact.
        let (mut death, mut outcome) = if starved {
            (Some(DeathCause::Starvation), TickOutcome::Moved)
        } else {
            self.apply_move(slot, new_head, died)
        };

        if death.is_none() {
            let snake = &self.registry[slot];
            let over_limit = self
                .config
                .starvation_steps
                .is_some_and(|limit| snake.steps_since_meal > limit);
            if snake.health.is_dead() || over_limit {
                death = Some(DeathCause::Starvation);
            }
        }

        let score = self.registry[slot].score;
        let pending = std::mem::take(&mut self.registry[slot].pending_reward);
        if let Some(cause) = death {
            outcome = TickOutcome::Died(cause);
            died[slot] = true;
            self.register_death(slot, cause);
            self.respawn_slot(slot);
        }

        let after = self.registry.distances(&self.grid, slot);
        let near_wall = self.registry[slot]
            .head()
            .is_some_and(|h| self.grid.near_wall(h));
        let preset = self.config.reward_preset(role);
        let reward = self
            .shaper
            .shape(preset, mode, &before, &after, outcome, near_wall)
            + pending;

        StepResult {
            reward,
            done: death.is_some(),
            score,
        }
    }

    /// Classify and apply one move. Returns the mover's death, if any.
    fn apply_move(
        &mut self,
        slot: SlotId,
        new_head: Point,
        died: &mut [bool],
    ) -> (Option<DeathCause>, TickOutcome) {
        match classify(&self.grid, &self.registry, new_head) {
            MoveOutcome::Wall => (Some(DeathCause::Wall), TickOutcome::Moved),
            MoveOutcome::Food => {
                self.eat(slot, new_head);
                (None, TickOutcome::Ate)
            }
            MoveOutcome::Encounter(contact) => {
                let report = resolve_encounter(&mut self.registry, &self.config, slot, contact);
                if report.mover_death.is_none() {
                    self.registry[slot].advance(new_head, false);
                }
                if let Some(occupant) = report.occupant {
                    if report.occupant_died {
                        self.kill_off_turn(occupant, slot, died);
                    }
                    if report.mover_death.is_some() && !self.same_team(slot, occupant) {
                        self.events.kills.push(KillEvent {
                            killer: occupant,
                            victim: slot,
                        });
                    }
                }
                (report.mover_death, TickOutcome::Moved)
            }
            MoveOutcome::Clear => {
                self.registry[slot].advance(new_head, false);
                (None, TickOutcome::Moved)
            }
        }
    }

    fn eat(&mut self, slot: SlotId, at: Point) {
        self.registry.remove_food(at);
        let heal = self.config.food_heal;
        let metric = self.config.score_metric;
        let snake = &mut self.registry[slot];
        snake.advance(at, true);
        snake.health.heal(heal);
        snake.score += 1;
        snake.steps_since_meal = 0;
        let team = snake.team;
        let value = score_of(metric, snake);

        if let Some(stats) = self.teams.get_mut(team) {
            stats.record = stats.record.max(value);
        }
        self.events.food.push(FoodEvent { slot, team, at });
        self.food
            .replenish(&self.grid, &mut self.registry, &mut self.rng);
        tracing::debug!(tick = self.tick, slot, team, x = at.x, y = at.y, "Food eaten");
    }

    /// Kill an agent on another agent's turn. Its death penalty and any
    /// staged reward are carried over the respawn.
    fn kill_off_turn(&mut self, victim: SlotId, killer: SlotId, died: &mut [bool]) {
        let penalty = self.config.reward_preset(self.registry[victim].role).death;
        let carried = std::mem::take(&mut self.registry[victim].pending_reward) + penalty;
        died[victim] = true;
        if !self.same_team(victim, killer) {
            self.events.kills.push(KillEvent { killer, victim });
        }
        self.register_death(victim, DeathCause::EnemyCollision);
        self.respawn_slot(victim);
        self.registry[victim].pending_reward = carried;
    }

    fn register_death(&mut self, slot: SlotId, cause: DeathCause) {
        let snake = &mut self.registry[slot];
        snake.kill(cause);
        let team = snake.team;
        self.total_deaths += 1;
        if let Some(stats) = self.teams.get_mut(team) {
            stats.deaths += 1;
        }
        self.events.deaths.push(DeathEvent { slot, team, cause });
        tracing::debug!(tick = self.tick, slot, team, cause = cause.label(), "Agent died");
    }

    /// Place a dead snake back on the grid. Leaves it dead if there is no room.
    fn respawn_slot(&mut self, slot: SlotId) -> bool {
        let Some(placement) = self
            .respawn
            .find_placement(&self.grid, &self.registry, &mut self.rng)
        else {
            tracing::warn!(tick = self.tick, slot, "No room to respawn, retrying next tick");
            return false;
        };
        let stats = self.config.role(self.registry[slot].role);
        let head = placement.body.front().copied();
        self.registry[slot].respawn(placement.body, placement.direction, stats);
        if let Some(head) = head {
            self.events.respawns.push(RespawnEvent { slot, head });
            tracing::debug!(tick = self.tick, slot, x = head.x, y = head.y, "Agent respawned");
        }
        true
    }

    fn same_team(&self, a: SlotId, b: SlotId) -> bool {
        self.registry[a].team == self.registry[b].team
    }

    fn refresh_team_scores(&mut self) {
        let metric = self.config.score_metric;
        for (team, stats) in self.teams.iter_mut().enumerate() {
            let best = self
                .registry
                .snakes()
                .iter()
                .filter(|s| s.is_alive && s.team == team)
                .map(|s| score_of(metric, s))
                .max()
                .unwrap_or(0);
            if stats.observe_score(best) {
                tracing::debug!(tick = self.tick, team = %stats.name, record = best, "New team record");
            }
        }
    }

    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self) {
        let mut seen = std::collections::BTreeSet::new();
        for snake in self.registry.snakes().iter().filter(|s| s.is_alive) {
            assert!(
                snake.health.current <= snake.health.max,
                "slot {} hp {} above max {}",
                snake.slot,
                snake.health.current,
                snake.health.max
            );
            assert!(!snake.is_empty(), "slot {} alive without a body", snake.slot);
            for p in &snake.body {
                assert!(self.grid.contains(*p), "slot {} outside grid at {p:?}", snake.slot);
                assert!(seen.insert(*p), "cell {p:?} covered twice");
            }
        }
        for food in self.registry.foods() {
            assert!(self.grid.contains(*food), "food outside grid at {food:?}");
        }
    }

    // ------------------------------------------------------------------
    // Scripted setup
    // ------------------------------------------------------------------

    /// Lay out every snake explicitly, one `(body, direction)` per slot.
    ///
    /// Bodies must be non-empty, inside the grid, made of orthogonally
    /// adjacent cells and disjoint from each other. Food under a body is
    /// removed. Each snake is reset as on respawn.
    pub fn place_snakes(&mut self, layout: &[(Vec<Point>, Direction)]) -> Result<()> {
        if layout.len() != self.registry.len() {
            return Err(ArenaError::LayoutMismatch {
                expected: self.registry.len(),
                actual: layout.len(),
            });
        }
        let mut taken = std::collections::BTreeSet::new();
        for (slot, (body, _)) in layout.iter().enumerate() {
            self.check_body(slot, body)?;
            for p in body {
                if !taken.insert(*p) {
                    return Err(ArenaError::InvalidPlacement {
                        slot,
                        message: format!("cell ({}, {}) is used twice", p.x, p.y),
                    });
                }
            }
        }
        for (slot, (body, direction)) in layout.iter().enumerate() {
            self.apply_body(slot, body, *direction);
        }
        Ok(())
    }

    /// Move one snake to an explicit body. The body may not overlap any
    /// other live snake.
    pub fn place_snake(&mut self, slot: SlotId, body: &[Point], direction: Direction) -> Result<()> {
        if slot >= self.registry.len() {
            return Err(ArenaError::UnknownSlot(slot));
        }
        self.check_body(slot, body)?;
        if let Some(p) = body
            .iter()
            .find(|p| self.registry.is_body_cell_except(**p, Some(slot)))
        {
            return Err(ArenaError::InvalidPlacement {
                slot,
                message: format!("cell ({}, {}) is occupied", p.x, p.y),
            });
        }
        self.apply_body(slot, body, direction);
        Ok(())
    }

    fn check_body(&self, slot: SlotId, body: &[Point]) -> Result<()> {
        let invalid = |message: String| ArenaError::InvalidPlacement { slot, message };
        if body.is_empty() {
            return Err(invalid("body is empty".to_string()));
        }
        if let Some(p) = body.iter().find(|p| !self.grid.contains(**p)) {
            return Err(invalid(format!("cell ({}, {}) is outside the grid", p.x, p.y)));
        }
        if body.windows(2).any(|w| !w[0].is_adjacent(w[1])) {
            return Err(invalid("segments are not adjacent".to_string()));
        }
        let unique: std::collections::BTreeSet<_> = body.iter().collect();
        if unique.len() != body.len() {
            return Err(invalid("body overlaps itself".to_string()));
        }
        Ok(())
    }

    fn apply_body(&mut self, slot: SlotId, body: &[Point], direction: Direction) {
        for p in body {
            self.registry.remove_food(*p);
        }
        let stats = self.config.role(self.registry[slot].role);
        self.registry[slot].respawn(body.iter().copied().collect(), direction, stats);
    }

    /// Replace the food set. Cells outside the grid or under a body are skipped.
    pub fn set_food(&mut self, points: impl IntoIterator<Item = Point>) {
        self.registry.clear_food();
        for p in points {
            if self.grid.contains(p) && self.registry.is_free(p) {
                self.registry.insert_food(p);
            }
        }
    }

    /// Remove all food. It is topped up again at the end of the next step.
    pub fn clear_food(&mut self) {
        self.registry.clear_food();
    }

    /// Set a snake's hp, clamped to its maximum.
    pub fn set_hp(&mut self, slot: SlotId, hp: u32) -> Result<()> {
        let snake = self
            .registry
            .get_mut(slot)
            .ok_or(ArenaError::UnknownSlot(slot))?;
        snake.health.current = hp.min(snake.health.max);
        Ok(())
    }

    /// Bump a team's generation counter, returning the new value.
    pub fn advance_generation(&mut self, team: &str) -> Result<u32> {
        let stats = self
            .teams
            .iter_mut()
            .find(|t| t.name == team)
            .ok_or_else(|| ArenaError::UnknownTeam(team.to_string()))?;
        stats.generation += 1;
        Ok(stats.generation)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Completed ticks.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Grid bounds and metric.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Seed the RNG was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Snakes in slot order.
    #[must_use]
    pub fn snakes(&self) -> &[Snake] {
        self.registry.snakes()
    }

    /// Food positions.
    #[must_use]
    pub fn foods(&self) -> impl Iterator<Item = Point> + '_ {
        self.registry.foods().iter().copied()
    }

    /// Number of food items.
    #[must_use]
    pub fn food_count(&self) -> usize {
        self.registry.foods().len()
    }

    /// Number of live agents.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.registry.live_count()
    }

    /// Whether `p` is outside the grid or covered by a live body.
    #[must_use]
    pub fn is_blocked(&self, p: Point) -> bool {
        !self.grid.contains(p) || self.registry.occupant_at(p).is_some()
    }

    /// Per-team counters, in configuration order.
    #[must_use]
    pub fn team_stats(&self) -> &[TeamStats] {
        &self.teams
    }

    /// Arena-wide counters.
    #[must_use]
    pub fn global_stats(&self) -> GlobalStats {
        GlobalStats {
            total_ticks: self.tick,
            elapsed_secs: self.clock.elapsed_secs(),
            total_deaths: self.total_deaths,
        }
    }

    /// Events of the most recent step.
    #[must_use]
    pub fn last_events(&self) -> &TickEvents {
        &self.events
    }

    /// Nearest food, enemy and ally distances for `slot`.
    #[must_use]
    pub fn distances(&self, slot: SlotId) -> crate::reward::Distances {
        self.registry.distances(&self.grid, slot)
    }

    /// Read-only projection for renderers and encoders.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        let snakes = self
            .registry
            .snakes()
            .iter()
            .map(|s| {
                let team = self.config.teams.get(s.team);
                SnakeView {
                    slot: s.slot,
                    team: s.team,
                    team_name: team.map(|t| t.name.clone()).unwrap_or_default(),
                    role: s.role,
                    body: s.body.iter().copied().collect(),
                    direction: s.direction,
                    hp: s.health.current,
                    max_hp: s.health.max,
                    score: s.score,
                    alive: s.is_alive,
                    steps_alive: s.steps_alive,
                    fitness: s.fitness(),
                    color: team.map_or((255, 255, 255), |t| t.color),
                }
            })
            .collect();
        GameState {
            tick: self.tick,
            snakes,
            foods: self.foods().collect(),
            global: self.global_stats(),
            teams: self.teams.clone(),
        }
    }

    /// Hash of the simulation state, for determinism checks.
    ///
    /// Covers the tick, every snake in slot order, the food set and the
    /// counters. Wall-clock time is excluded.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);

        self.registry.len().hash(&mut hasher);
        for snake in self.registry.snakes() {
            snake.slot.hash(&mut hasher);
            snake.team.hash(&mut hasher);
            snake.role.hash(&mut hasher);
            snake.direction.hash(&mut hasher);
            snake.body.len().hash(&mut hasher);
            for p in &snake.body {
                p.hash(&mut hasher);
            }
            snake.health.hash(&mut hasher);
            snake.score.hash(&mut hasher);
            snake.is_alive.hash(&mut hasher);
            snake.steps_alive.hash(&mut hasher);
            snake.steps_since_meal.hash(&mut hasher);
            snake.deaths.hash(&mut hasher);
            snake.pending_reward.to_bits().hash(&mut hasher);
        }

        self.registry.foods().len().hash(&mut hasher);
        for food in self.registry.foods() {
            food.hash(&mut hasher);
        }

        self.total_deaths.hash(&mut hasher);
        for team in &self.teams {
            team.record.hash(&mut hasher);
            team.deaths.hash(&mut hasher);
            team.current_score.hash(&mut hasher);
            team.generation.hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn score_of(metric: ScoreMetric, snake: &Snake) -> u32 {
    match metric {
        ScoreMetric::FoodEaten => snake.score,
        ScoreMetric::BodyLength => u32::try_from(snake.len()).unwrap_or(u32::MAX),
    }
}
