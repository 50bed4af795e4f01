//! Read-only projection of the arena for renderers and encoders.

use serde::{Deserialize, Serialize};

use crate::config::Role;
use crate::grid::{Direction, Point};
use crate::snake::SlotId;
use crate::stats::{GlobalStats, TeamStats};

/// One snake as seen from outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeView {
    /// Arena slot.
    pub slot: SlotId,
    /// Team index.
    pub team: usize,
    /// Team name.
    pub team_name: String,
    /// Combat role.
    pub role: Role,
    /// Body cells, head first.
    pub body: Vec<Point>,
    /// Heading.
    pub direction: Direction,
    /// Current hp.
    pub hp: u32,
    /// Hp cap.
    pub max_hp: u32,
    /// Score since the last respawn.
    pub score: u32,
    /// Alive flag.
    pub alive: bool,
    /// Moves since the last respawn.
    pub steps_alive: u64,
    /// Evolutionary fitness, see [`Snake::fitness`](crate::snake::Snake::fitness).
    pub fitness: u64,
    /// Team display color.
    pub color: (u8, u8, u8),
}

/// Full arena state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Completed ticks.
    pub tick: u64,
    /// Snakes in slot order.
    pub snakes: Vec<SnakeView>,
    /// Food positions in sorted order.
    pub foods: Vec<Point>,
    /// Arena-wide counters.
    pub global: GlobalStats,
    /// Per-team counters, in configuration order.
    pub teams: Vec<TeamStats>,
}

impl GameState {
    /// Snakes belonging to team `team`.
    pub fn team_snakes(&self, team: usize) -> impl Iterator<Item = &SnakeView> {
        self.snakes.iter().filter(move |s| s.team == team)
    }
}
