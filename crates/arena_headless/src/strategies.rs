//! Built-in policies for driving agents without an external learner.
//!
//! Policies see the arena read-only and pick one absolute direction per
//! agent per tick. They never reverse onto their own neck.

use std::fmt;
use std::result::Result;
use std::str::FromStr;

use arena_core::prelude::*;
use arena_core::rng::ArenaRng;
use serde::{Deserialize, Serialize};

/// Chooses a move for one agent.
pub trait Policy: Send {
    /// Direction for the agent in `slot` given the current arena.
    fn act(&mut self, arena: &Arena, slot: SlotId) -> Direction;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Selectable built-in strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum StrategyKind {
    /// Uniformly random relative turn.
    Random,
    /// Head for the nearest food, avoiding cells that kill on entry.
    #[default]
    Greedy,
    /// Never turn.
    Straight,
}

impl StrategyKind {
    /// Build a policy instance. `seed` only matters for [`StrategyKind::Random`].
    #[must_use]
    pub fn build(self, seed: u64) -> Box<dyn Policy> {
        match self {
            StrategyKind::Random => Box::new(RandomPolicy::new(seed)),
            StrategyKind::Greedy => Box::new(GreedyPolicy),
            StrategyKind::Straight => Box::new(StraightPolicy),
        }
    }

    /// One policy per agent. Random policies get distinct seeds per slot.
    #[must_use]
    pub fn build_all(self, agents: usize, seed: u64) -> Vec<Box<dyn Policy>> {
        (0..agents)
            .map(|slot| self.build(seed.wrapping_mul(31).wrapping_add(slot as u64)))
            .collect()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Random => "random",
            StrategyKind::Greedy => "greedy",
            StrategyKind::Straight => "straight",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(StrategyKind::Random),
            "greedy" => Ok(StrategyKind::Greedy),
            "straight" => Ok(StrategyKind::Straight),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// Collect one action per agent from `policies`, in slot order.
pub fn collect_actions(policies: &mut [Box<dyn Policy>], arena: &Arena) -> Vec<Direction> {
    policies
        .iter_mut()
        .enumerate()
        .map(|(slot, policy)| policy.act(arena, slot))
        .collect()
}

fn heading(arena: &Arena, slot: SlotId) -> Direction {
    arena
        .snakes()
        .get(slot)
        .map_or(Direction::Up, |snake| snake.direction)
}

/// Keeps the current heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightPolicy;

impl Policy for StraightPolicy {
    fn act(&mut self, arena: &Arena, slot: SlotId) -> Direction {
        heading(arena, slot)
    }

    fn name(&self) -> &'static str {
        "straight"
    }
}

/// Random relative turns from its own seeded RNG.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: ArenaRng,
}

impl RandomPolicy {
    /// Create a policy with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ArenaRng::new(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, arena: &Arena, slot: SlotId) -> Direction {
        let index = self.rng.random_range(0..3usize);
        let turn = RelativeTurn::from_index(index).unwrap_or(RelativeTurn::Straight);
        heading(arena, slot).turned(turn)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Moves toward the nearest food while avoiding walls and bodies.
///
/// Candidates are straight, right and left, in that order. Among the safe
/// ones the policy takes the one with the smallest Manhattan distance to any
/// food; ties keep candidate order. With no safe move it goes straight.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    fn food_distance(arena: &Arena, p: Point) -> i32 {
        arena
            .foods()
            .map(|f| (f.x - p.x).abs() + (f.y - p.y).abs())
            .min()
            .unwrap_or(0)
    }
}

impl Policy for GreedyPolicy {
    fn act(&mut self, arena: &Arena, slot: SlotId) -> Direction {
        let current = heading(arena, slot);
        let Some(head) = arena.snakes().get(slot).and_then(|s| s.head()) else {
            return current;
        };

        let mut best: Option<(i32, Direction)> = None;
        for turn in [RelativeTurn::Straight, RelativeTurn::Right, RelativeTurn::Left] {
            let direction = current.turned(turn);
            let next = head.step(direction);
            if arena.is_blocked(next) {
                continue;
            }
            let distance = Self::food_distance(arena, next);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, direction));
            }
        }
        best.map_or(current, |(_, direction)| direction)
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}
