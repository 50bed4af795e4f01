//! Tick events and interval analytics.
//!
//! Every [`Arena::step`](crate::engine::Arena::step) records what happened
//! in a [`TickEvents`]. [`IntervalStats`] folds those into per-team food and
//! death counts and closes an [`IntervalSummary`] every `stats_interval`
//! ticks. Persisting summaries is left to the caller.

use serde::{Deserialize, Serialize};

use crate::grid::Point;
use crate::snake::{DeathCause, SlotId};

/// An agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathEvent {
    /// Dead agent.
    pub slot: SlotId,
    /// Its team index.
    pub team: usize,
    /// Why it died.
    pub cause: DeathCause,
}

/// An agent ate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodEvent {
    /// Agent that ate.
    pub slot: SlotId,
    /// Its team index.
    pub team: usize,
    /// Where the food was.
    pub at: Point,
}

/// An agent was credited with another agent's death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    /// Credited agent.
    pub killer: SlotId,
    /// Agent that died.
    pub victim: SlotId,
}

/// A dead agent was placed back on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnEvent {
    /// Respawned agent.
    pub slot: SlotId,
    /// New head.
    pub head: Point,
}

/// Everything notable that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after the step completed.
    pub tick: u64,
    /// Deaths, in the order they happened.
    pub deaths: Vec<DeathEvent>,
    /// Meals.
    pub food: Vec<FoodEvent>,
    /// Kill credits (enemy teams only).
    pub kills: Vec<KillEvent>,
    /// Respawns.
    pub respawns: Vec<RespawnEvent>,
}

/// Deaths broken down by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseCounts {
    /// Ran into a wall.
    pub wall: u64,
    /// Ran into itself.
    pub self_collision: u64,
    /// Lost a contact with another snake.
    pub enemy_collision: u64,
    /// Starved.
    pub starvation: u64,
}

impl CauseCounts {
    /// Count one death.
    pub fn record(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::Wall => self.wall += 1,
            DeathCause::SelfCollision => self.self_collision += 1,
            DeathCause::EnemyCollision => self.enemy_collision += 1,
            DeathCause::Starvation => self.starvation += 1,
        }
    }

    /// Count for one cause.
    #[must_use]
    pub const fn get(&self, cause: DeathCause) -> u64 {
        match cause {
            DeathCause::Wall => self.wall,
            DeathCause::SelfCollision => self.self_collision,
            DeathCause::EnemyCollision => self.enemy_collision,
            DeathCause::Starvation => self.starvation,
        }
    }
}

/// One team's totals over an interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInterval {
    /// Team name.
    pub team: String,
    /// Food eaten.
    pub food: u64,
    /// Deaths.
    pub deaths: u64,
    /// Deaths by cause.
    pub causes: CauseCounts,
}

impl TeamInterval {
    fn new(team: String) -> Self {
        Self {
            team,
            food: 0,
            deaths: 0,
            causes: CauseCounts::default(),
        }
    }

    /// Food per death. With no deaths this is just the food count.
    #[must_use]
    pub fn food_death_ratio(&self) -> f64 {
        if self.deaths == 0 {
            self.food as f64
        } else {
            self.food as f64 / self.deaths as f64
        }
    }
}

/// A closed analytics interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    /// Tick at which the interval closed.
    pub tick: u64,
    /// Per-team totals, in configuration order.
    pub teams: Vec<TeamInterval>,
}

/// Accumulates [`TickEvents`] into fixed-length intervals.
#[derive(Debug, Clone)]
pub struct IntervalStats {
    interval: u64,
    names: Vec<String>,
    current: Vec<TeamInterval>,
}

impl IntervalStats {
    /// Track the given teams, closing an interval every `interval` ticks.
    /// An interval of 0 never closes.
    #[must_use]
    pub fn new(team_names: Vec<String>, interval: u64) -> Self {
        let current = team_names.iter().cloned().map(TeamInterval::new).collect();
        Self {
            interval,
            names: team_names,
            current,
        }
    }

    /// Totals of the interval in progress.
    #[must_use]
    pub fn current(&self) -> &[TeamInterval] {
        &self.current
    }

    /// Fold one tick in. Returns the summary if this tick closed an interval.
    pub fn observe(&mut self, events: &TickEvents) -> Option<IntervalSummary> {
        for food in &events.food {
            if let Some(team) = self.current.get_mut(food.team) {
                team.food += 1;
            }
        }
        for death in &events.deaths {
            if let Some(team) = self.current.get_mut(death.team) {
                team.deaths += 1;
                team.causes.record(death.cause);
            }
        }

        if self.interval == 0 || events.tick == 0 || events.tick % self.interval != 0 {
            return None;
        }
        let fresh = self.names.iter().cloned().map(TeamInterval::new).collect();
        Some(IntervalSummary {
            tick: events.tick,
            teams: std::mem::replace(&mut self.current, fresh),
        })
    }
}

/// Receives tick events as they are produced.
pub trait AnalyticsSink {
    /// Called once per completed tick.
    fn on_tick(&mut self, events: &TickEvents);
}

impl AnalyticsSink for IntervalStats {
    fn on_tick(&mut self, events: &TickEvents) {
        if let Some(summary) = self.observe(events) {
            for team in &summary.teams {
                tracing::info!(
                    tick = summary.tick,
                    team = %team.team,
                    food = team.food,
                    deaths = team.deaths,
                    ratio = team.food_death_ratio(),
                    "Interval summary"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(tick: u64, food_teams: &[usize], deaths: &[(usize, DeathCause)]) -> TickEvents {
        TickEvents {
            tick,
            food: food_teams
                .iter()
                .map(|&team| FoodEvent {
                    slot: 0,
                    team,
                    at: Point::new(0, 0),
                })
                .collect(),
            deaths: deaths
                .iter()
                .map(|&(team, cause)| DeathEvent {
                    slot: 0,
                    team,
                    cause,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_interval_closes_and_resets() {
        let mut stats = IntervalStats::new(vec!["A".into(), "B".into()], 3);
        assert!(stats
            .observe(&events(1, &[0, 0], &[(1, DeathCause::Wall)]))
            .is_none());
        assert!(stats
            .observe(&events(2, &[1], &[(1, DeathCause::Starvation)]))
            .is_none());
        let summary = stats
            .observe(&events(3, &[0], &[(0, DeathCause::EnemyCollision)]))
            .unwrap();

        assert_eq!(summary.tick, 3);
        let a = &summary.teams[0];
        assert_eq!((a.food, a.deaths), (3, 1));
        assert!((a.food_death_ratio() - 3.0).abs() < 1e-9);
        let b = &summary.teams[1];
        assert_eq!((b.food, b.deaths), (1, 2));
        assert_eq!(b.causes.get(DeathCause::Wall), 1);
        assert_eq!(b.causes.get(DeathCause::Starvation), 1);
        assert!((b.food_death_ratio() - 0.5).abs() < 1e-9);

        assert!(stats.current().iter().all(|t| t.food == 0 && t.deaths == 0));
    }

    #[test]
    fn test_ratio_without_deaths_is_food() {
        let mut stats = IntervalStats::new(vec!["A".into()], 1);
        let summary = stats.observe(&events(1, &[0, 0, 0, 0], &[])).unwrap();
        assert!((summary.teams[0].food_death_ratio() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_interval_never_closes() {
        let mut stats = IntervalStats::new(vec!["A".into()], 0);
        for tick in 1..10 {
            assert!(stats.observe(&events(tick, &[0], &[])).is_none());
        }
        assert_eq!(stats.current()[0].food, 9);
    }
}
