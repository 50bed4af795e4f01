//! Snake entity and its health component.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{RewardMode, Role, RoleConfig};
use crate::grid::{Direction, Point};

/// Stable index of an agent. Slots are assigned team by team in
/// configuration order and never change for the lifetime of an arena.
pub type SlotId = usize;

/// Why a snake died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Head left the grid.
    Wall,
    /// Head ran into its own body.
    SelfCollision,
    /// Lost a body-to-body encounter with another snake.
    EnemyCollision,
    /// Hp ran out, or too long without food.
    Starvation,
}

impl DeathCause {
    /// All causes, in reporting order.
    pub const ALL: [DeathCause; 4] = [
        DeathCause::Wall,
        DeathCause::SelfCollision,
        DeathCause::EnemyCollision,
        DeathCause::Starvation,
    ];

    /// Short label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DeathCause::Wall => "wall",
            DeathCause::SelfCollision => "self",
            DeathCause::EnemyCollision => "enemy",
            DeathCause::Starvation => "starve",
        }
    }
}

/// Hit points with a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create health at `current`, clamped to `max`.
    #[must_use]
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Check if health is exhausted.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal up to the cap, returning actual amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current += actual;
        actual
    }
}

/// One agent in the arena.
///
/// A snake is created once per team slot and reset in place when it dies,
/// so its slot identity outlives any number of respawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snake {
    /// Arena slot.
    pub slot: SlotId,
    /// Team index in the configuration.
    pub team: usize,
    /// Combat role.
    pub role: Role,
    /// Shaping mode inherited from the team.
    pub reward_mode: RewardMode,
    /// Occupied cells, head first.
    pub body: VecDeque<Point>,
    /// Current heading.
    pub direction: Direction,
    /// Hit points.
    pub health: Health,
    /// Food eaten since the last respawn (recomputed from length after truncation).
    pub score: u32,
    /// False between a death and the following respawn.
    pub is_alive: bool,
    /// Moves made since the last respawn.
    pub steps_alive: u64,
    /// Ticks since the last meal.
    pub steps_since_meal: u32,
    /// Reward staged by other agents' actions, paid on this agent's next reward.
    pub pending_reward: f32,
    /// Lifetime death count of this slot.
    pub deaths: u32,
    /// Cause of the most recent death.
    pub last_death: Option<DeathCause>,
}

impl Snake {
    /// Create an unspawned snake for a slot.
    #[must_use]
    pub fn new(slot: SlotId, team: usize, role: Role, reward_mode: RewardMode, stats: RoleConfig) -> Self {
        Self {
            slot,
            team,
            role,
            reward_mode,
            body: VecDeque::new(),
            direction: Direction::Right,
            health: Health::new(stats.start_hp, stats.max_hp),
            score: 0,
            is_alive: false,
            steps_alive: 0,
            steps_since_meal: 0,
            pending_reward: 0.0,
            deaths: 0,
            last_death: None,
        }
    }

    /// Current head, if the snake has a body.
    #[must_use]
    pub fn head(&self) -> Option<Point> {
        self.body.front().copied()
    }

    /// Body length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.health.current
    }

    /// Change heading. A 180° reversal is ignored and reported as `false`.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if direction.is_opposite(self.direction) {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Where the head would be after one move in the current direction.
    #[must_use]
    pub fn predicted_head(&self) -> Option<Point> {
        self.head().map(|h| h.step(self.direction))
    }

    /// Index of the body segment covering `p`.
    #[must_use]
    pub fn segment_at(&self, p: Point) -> Option<usize> {
        self.body.iter().position(|&segment| segment == p)
    }

    /// Move the head to `new_head`; the tail follows unless `grow` is set.
    pub fn advance(&mut self, new_head: Point, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
        self.steps_alive += 1;
    }

    /// Cut the body at `segment`, dropping that segment and everything
    /// behind it. Returns how many segments were removed.
    pub fn truncate_at(&mut self, segment: usize) -> usize {
        let before = self.body.len();
        self.body.truncate(segment);
        before - self.body.len()
    }

    /// Mark the snake dead.
    pub fn kill(&mut self, cause: DeathCause) {
        self.is_alive = false;
        self.health.current = 0;
        self.deaths += 1;
        self.last_death = Some(cause);
    }

    /// Reinitialize in place at a fresh location.
    pub fn respawn(&mut self, body: VecDeque<Point>, direction: Direction, stats: RoleConfig) {
        self.body = body;
        self.direction = direction;
        self.health = Health::new(stats.start_hp, stats.max_hp);
        self.score = 0;
        self.is_alive = true;
        self.steps_alive = 0;
        self.steps_since_meal = 0;
        self.pending_reward = 0.0;
    }

    /// Fitness used by evolutionary trainers: food dominates, survival breaks ties.
    #[must_use]
    pub fn fitness(&self) -> u64 {
        u64::from(self.score) * 500 + self.steps_alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawned() -> Snake {
        let mut snake = Snake::new(0, 0, Role::Harvester, RewardMode::Linear, RoleConfig::harvester());
        snake.respawn(
            [Point::new(5, 5), Point::new(4, 5), Point::new(3, 5)]
                .into_iter()
                .collect(),
            Direction::Right,
            RoleConfig::harvester(),
        );
        snake
    }

    #[test]
    fn test_health_clamps() {
        let mut health = Health::new(120, 100);
        assert_eq!(health.current, 100);
        assert_eq!(health.apply_damage(30), 30);
        assert_eq!(health.heal(50), 30);
        assert_eq!(health.current, 100);
        assert_eq!(health.apply_damage(500), 100);
        assert!(health.is_dead());
    }

    #[test]
    fn test_reversal_ignored() {
        let mut snake = spawned();
        assert!(!snake.set_direction(Direction::Left));
        assert_eq!(snake.direction, Direction::Right);
        assert!(snake.set_direction(Direction::Up));
        assert_eq!(snake.predicted_head(), Some(Point::new(5, 4)));
    }

    #[test]
    fn test_advance_keeps_length() {
        let mut snake = spawned();
        snake.advance(Point::new(6, 5), false);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Some(Point::new(6, 5)));
        assert_eq!(snake.segment_at(Point::new(3, 5)), None);

        snake.advance(Point::new(7, 5), true);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.steps_alive, 2);
    }

    #[test]
    fn test_truncate() {
        let mut snake = spawned();
        assert_eq!(snake.truncate_at(1), 2);
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.truncate_at(0), 1);
        assert!(snake.is_empty());
        assert_eq!(snake.head(), None);
    }

    #[test]
    fn test_kill_and_respawn_reset() {
        let mut snake = spawned();
        snake.score = 4;
        snake.pending_reward = 3.0;
        snake.kill(DeathCause::Wall);
        assert!(!snake.is_alive);
        assert_eq!(snake.hp(), 0);
        assert_eq!(snake.last_death, Some(DeathCause::Wall));

        snake.respawn(
            [Point::new(8, 8)].into_iter().collect(),
            Direction::Down,
            RoleConfig::harvester(),
        );
        assert!(snake.is_alive);
        assert_eq!(snake.score, 0);
        assert_eq!(snake.hp(), 100);
        assert_eq!(snake.deaths, 1);
        assert!(snake.pending_reward.abs() < f32::EPSILON);
    }
}
