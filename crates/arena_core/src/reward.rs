//! Reward shaping.
//!
//! Event ticks (eating, dying, starving) pay a fixed preset value. Every other
//! tick is shaped from how the distances to the nearest food, enemy and ally
//! changed across the move:
//!
//! - [`RewardMode::Linear`] pays `step_closer_*` when a distance shrank and
//!   `step_farther_*` otherwise, regardless of by how much.
//! - [`RewardMode::Dynamic`] scales those presets by the change measured in
//!   cells (`|Δdistance| / cell_size`); an unchanged distance pays nothing.
//!
//! Movement ticks always add `idle_penalty`, plus `wall_penalty` when the
//! head ends within two cells of a border. Pending combat rewards are added
//! by the caller, not here.

use serde::{Deserialize, Serialize};

use crate::config::{RewardMode, RewardPreset};
use crate::snake::DeathCause;

/// Distances from a head to the nearest target of each kind, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distances {
    /// Nearest food.
    pub food: Option<f32>,
    /// Nearest enemy head.
    pub enemy: Option<f32>,
    /// Nearest ally head.
    pub ally: Option<f32>,
}

/// How an agent's tick ended, as far as rewards are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Ordinary move (including winning a fight).
    Moved,
    /// Ate food.
    Ate,
    /// Died.
    Died(DeathCause),
}

impl TickOutcome {
    /// Whether this outcome pays a fixed event value instead of shaping.
    #[must_use]
    pub const fn is_event(self) -> bool {
        !matches!(self, TickOutcome::Moved)
    }
}

/// Computes per-tick rewards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardShaper {
    cell_size: f32,
}

impl RewardShaper {
    /// Create a shaper for a grid with the given cell size.
    #[must_use]
    pub const fn new(cell_size: f32) -> Self {
        Self { cell_size }
    }

    /// Reward for one tick, excluding pending combat rewards.
    #[must_use]
    pub fn shape(
        &self,
        preset: &RewardPreset,
        mode: RewardMode,
        before: &Distances,
        after: &Distances,
        outcome: TickOutcome,
        near_wall: bool,
    ) -> f32 {
        match outcome {
            TickOutcome::Ate => return preset.food,
            TickOutcome::Died(DeathCause::Starvation) => return preset.starve,
            TickOutcome::Died(_) => return preset.death,
            TickOutcome::Moved => {}
        }

        let mut reward = preset.idle_penalty;
        reward += self.term(
            mode,
            before.food,
            after.food,
            preset.step_closer_food,
            preset.step_farther_food,
        );
        reward += self.term(
            mode,
            before.enemy,
            after.enemy,
            preset.step_closer_enemy,
            preset.step_farther_enemy,
        );
        reward += self.term(
            mode,
            before.ally,
            after.ally,
            preset.step_closer_ally,
            preset.step_farther_ally,
        );
        if near_wall {
            reward += preset.wall_penalty;
        }
        reward
    }

    fn term(
        &self,
        mode: RewardMode,
        before: Option<f32>,
        after: Option<f32>,
        closer: f32,
        farther: f32,
    ) -> f32 {
        let (Some(before), Some(after)) = (before, after) else {
            return 0.0;
        };
        match mode {
            RewardMode::Linear => {
                if after < before {
                    closer
                } else {
                    farther
                }
            }
            RewardMode::Dynamic => {
                let cells = (before - after) / self.cell_size;
                if cells > 0.0 {
                    cells * closer
                } else if cells < 0.0 {
                    cells.abs() * farther
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn food_only(d: f32) -> Distances {
        Distances {
            food: Some(d),
            ..Default::default()
        }
    }

    #[test]
    fn test_events_ignore_shaping() {
        let shaper = RewardShaper::new(20.0);
        let preset = RewardPreset::harvester();
        let before = food_only(100.0);
        let after = food_only(20.0);
        for mode in [RewardMode::Linear, RewardMode::Dynamic] {
            assert!(approx(
                shaper.shape(&preset, mode, &before, &after, TickOutcome::Ate, true),
                preset.food
            ));
            assert!(approx(
                shaper.shape(
                    &preset,
                    mode,
                    &before,
                    &after,
                    TickOutcome::Died(DeathCause::Wall),
                    true
                ),
                preset.death
            ));
            assert!(approx(
                shaper.shape(
                    &preset,
                    mode,
                    &before,
                    &after,
                    TickOutcome::Died(DeathCause::Starvation),
                    false
                ),
                preset.starve
            ));
        }
    }

    #[test]
    fn test_linear_ignores_magnitude() {
        let shaper = RewardShaper::new(20.0);
        let preset = RewardPreset::harvester();
        let expected = preset.idle_penalty + preset.step_closer_food;

        let small = shaper.shape(
            &preset,
            RewardMode::Linear,
            &food_only(100.0),
            &food_only(99.0),
            TickOutcome::Moved,
            false,
        );
        let large = shaper.shape(
            &preset,
            RewardMode::Linear,
            &food_only(100.0),
            &food_only(20.0),
            TickOutcome::Moved,
            false,
        );
        assert!(approx(small, expected));
        assert!(approx(large, expected));

        let near_wall = shaper.shape(
            &preset,
            RewardMode::Linear,
            &food_only(100.0),
            &food_only(80.0),
            TickOutcome::Moved,
            true,
        );
        assert!(approx(near_wall, expected + preset.wall_penalty));
    }

    #[test]
    fn test_linear_equal_distance_counts_as_farther() {
        let shaper = RewardShaper::new(20.0);
        let preset = RewardPreset::harvester();
        let r = shaper.shape(
            &preset,
            RewardMode::Linear,
            &food_only(40.0),
            &food_only(40.0),
            TickOutcome::Moved,
            false,
        );
        assert!(approx(r, preset.idle_penalty + preset.step_farther_food));
    }

    #[test]
    fn test_dynamic_scales_with_delta() {
        let shaper = RewardShaper::new(20.0);
        let preset = RewardPreset::harvester();
        let one = shaper.shape(
            &preset,
            RewardMode::Dynamic,
            &food_only(100.0),
            &food_only(80.0),
            TickOutcome::Moved,
            false,
        ) - preset.idle_penalty;
        let two = shaper.shape(
            &preset,
            RewardMode::Dynamic,
            &food_only(100.0),
            &food_only(60.0),
            TickOutcome::Moved,
            false,
        ) - preset.idle_penalty;
        assert!(approx(one, preset.step_closer_food));
        assert!(approx(two, 2.0 * one));

        let away = shaper.shape(
            &preset,
            RewardMode::Dynamic,
            &food_only(60.0),
            &food_only(90.0),
            TickOutcome::Moved,
            false,
        ) - preset.idle_penalty;
        assert!(approx(away, 1.5 * preset.step_farther_food));

        let still = shaper.shape(
            &preset,
            RewardMode::Dynamic,
            &food_only(60.0),
            &food_only(60.0),
            TickOutcome::Moved,
            false,
        );
        assert!(approx(still, preset.idle_penalty));
    }

    #[test]
    fn test_missing_targets_contribute_nothing() {
        let shaper = RewardShaper::new(20.0);
        let preset = RewardPreset::hunter();
        let before = Distances {
            food: None,
            enemy: Some(100.0),
            ally: None,
        };
        let after = Distances {
            food: Some(10.0),
            enemy: Some(80.0),
            ally: Some(5.0),
        };
        let r = shaper.shape(
            &preset,
            RewardMode::Linear,
            &before,
            &after,
            TickOutcome::Moved,
            false,
        );
        assert!(approx(r, preset.idle_penalty + preset.step_closer_enemy));
    }

    #[test]
    fn test_terms_are_independent() {
        let shaper = RewardShaper::new(1.0);
        let preset = RewardPreset {
            step_closer_food: 1.0,
            step_farther_enemy: 10.0,
            step_closer_ally: 100.0,
            ..RewardPreset::zero()
        };
        let before = Distances {
            food: Some(5.0),
            enemy: Some(5.0),
            ally: Some(5.0),
        };
        let after = Distances {
            food: Some(4.0),
            enemy: Some(6.0),
            ally: Some(4.0),
        };
        let r = shaper.shape(
            &preset,
            RewardMode::Linear,
            &before,
            &after,
            TickOutcome::Moved,
            false,
        );
        assert!(approx(r, 111.0));
    }
}
