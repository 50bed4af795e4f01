//! Typed arena configuration.
//!
//! All configuration is plain data, deserialized from RON and validated once
//! when an [`Arena`](crate::engine::Arena) is built. After construction the
//! configuration is immutable.
//!
//! # Example RON
//!
//! ```ron
//! ArenaConfig(
//!     grid_width: 30,
//!     grid_height: 30,
//!     food_count: 4,
//!     teams: [
//!         TeamConfig(
//!             name: "Hunters",
//!             count: 2,
//!             color: (200, 40, 40),
//!             roles: [Hunter, Hunter],
//!             reward_mode: Dynamic,
//!         ),
//!     ],
//! )
//! ```
//!
//! Fields left out fall back to [`ArenaConfig::default`]; the role and
//! reward tables fall back to [`RoleConfig::for_role`] and
//! [`RewardPreset::for_role`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::grid::{Grid, WALL_MARGIN};

/// Combat profile of an agent, independent of its team.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Role {
    /// Food gatherer. Dies on any body contact it initiates.
    #[default]
    Harvester,
    /// Fighter. Survives contact, damages and truncates the body it hits.
    Hunter,
}

impl Role {
    /// All roles.
    pub const ALL: [Role; 2] = [Role::Harvester, Role::Hunter];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Role::Harvester => "Harvester",
            Role::Hunter => "Hunter",
        }
    }
}

/// Movement reward shaping mode of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RewardMode {
    /// Fixed reward per tick of getting closer or farther.
    #[default]
    Linear,
    /// Reward proportional to how many cells closer or farther.
    Dynamic,
}

/// Policy family driving a team. Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BrainKind {
    /// Gradient-trained reinforcement learner.
    #[default]
    Rl,
    /// Evolutionary population.
    Genetic,
    /// Hand-written strategy.
    Scripted,
}

/// Which per-snake value feeds the team's current score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ScoreMetric {
    /// Food eaten since the last respawn.
    #[default]
    FoodEaten,
    /// Current body length.
    BodyLength,
}

/// Health and combat parameters of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Health cap.
    pub max_hp: u32,
    /// Health after (re)spawning.
    pub start_hp: u32,
    /// Damage inflicted on the body this role runs into.
    pub damage_dealt: u32,
    /// Counter damage taken by anyone who runs into this role's body.
    pub self_damage: u32,
    /// Whether this role survives contact it initiates.
    pub collision_survivable: bool,
}

impl RoleConfig {
    /// Default harvester profile.
    #[must_use]
    pub const fn harvester() -> Self {
        Self {
            max_hp: 100,
            start_hp: 100,
            damage_dealt: 0,
            self_damage: 10,
            collision_survivable: false,
        }
    }

    /// Default hunter profile.
    #[must_use]
    pub const fn hunter() -> Self {
        Self {
            max_hp: 150,
            start_hp: 150,
            damage_dealt: 40,
            self_damage: 20,
            collision_survivable: true,
        }
    }

    /// Built-in profile for a role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Harvester => Self::harvester(),
            Role::Hunter => Self::hunter(),
        }
    }
}

/// Reward values for one role.
///
/// Every key defaults to `0.0`, so a preset only needs to list the terms it
/// cares about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPreset {
    /// Paid on a tick where the agent eats.
    pub food: f32,
    /// Paid on a tick where the agent dies from a wall or a collision.
    pub death: f32,
    /// Paid on a tick where the agent starves.
    pub starve: f32,
    /// Distance to nearest food decreased.
    pub step_closer_food: f32,
    /// Distance to nearest food did not decrease.
    pub step_farther_food: f32,
    /// Distance to nearest enemy head decreased.
    pub step_closer_enemy: f32,
    /// Distance to nearest enemy head did not decrease.
    pub step_farther_enemy: f32,
    /// Distance to nearest ally head decreased.
    pub step_closer_ally: f32,
    /// Distance to nearest ally head did not decrease.
    pub step_farther_ally: f32,
    /// Added on every non-event tick.
    pub idle_penalty: f32,
    /// Added on non-event ticks that end with the head near a wall.
    pub wall_penalty: f32,
    /// Staged for an agent that runs into a teammate.
    pub friendly_fire: f32,
    /// Staged for an agent credited with an enemy death.
    pub kill_reward: f32,
    /// Staged for an agent that damages an enemy.
    pub damage_dealt_reward: f32,
}

impl Default for RewardPreset {
    fn default() -> Self {
        Self::zero()
    }
}

impl RewardPreset {
    /// A preset where every term is zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            food: 0.0,
            death: 0.0,
            starve: 0.0,
            step_closer_food: 0.0,
            step_farther_food: 0.0,
            step_closer_enemy: 0.0,
            step_farther_enemy: 0.0,
            step_closer_ally: 0.0,
            step_farther_ally: 0.0,
            idle_penalty: 0.0,
            wall_penalty: 0.0,
            friendly_fire: 0.0,
            kill_reward: 0.0,
            damage_dealt_reward: 0.0,
        }
    }

    /// Default harvester rewards: chase food, keep away from enemies.
    #[must_use]
    pub fn harvester() -> Self {
        Self {
            food: 15.0,
            death: -10.0,
            starve: -10.0,
            step_closer_food: 1.0,
            step_farther_food: -1.5,
            step_closer_enemy: -0.2,
            step_farther_enemy: 0.2,
            step_closer_ally: 0.0,
            step_farther_ally: 0.0,
            idle_penalty: -0.01,
            wall_penalty: -0.1,
            friendly_fire: -5.0,
            kill_reward: 0.0,
            damage_dealt_reward: 0.0,
        }
    }

    /// Default hunter rewards: chase enemies, food is secondary.
    #[must_use]
    pub fn hunter() -> Self {
        Self {
            food: 5.0,
            death: -10.0,
            starve: -10.0,
            step_closer_food: 0.2,
            step_farther_food: -0.3,
            step_closer_enemy: 1.0,
            step_farther_enemy: -1.0,
            step_closer_ally: 0.0,
            step_farther_ally: 0.0,
            idle_penalty: -0.01,
            wall_penalty: -0.1,
            friendly_fire: -5.0,
            kill_reward: 25.0,
            damage_dealt_reward: 5.0,
        }
    }

    /// Built-in preset for a role.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Harvester => Self::harvester(),
            Role::Hunter => Self::hunter(),
        }
    }
}

static ZERO_PRESET: RewardPreset = RewardPreset::zero();

/// A team of agents sharing a name, color and shaping mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Unique team name.
    pub name: String,
    /// Number of agents.
    pub count: usize,
    /// Display color (RGB).
    #[serde(default = "default_color")]
    pub color: (u8, u8, u8),
    /// Role per agent. Empty means every agent is a [`Role::Harvester`];
    /// otherwise exactly `count` entries.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Movement shaping mode.
    #[serde(default)]
    pub reward_mode: RewardMode,
    /// Policy family (not interpreted by the engine).
    #[serde(default)]
    pub brain: BrainKind,
}

fn default_color() -> (u8, u8, u8) {
    (0, 180, 0)
}

impl TeamConfig {
    /// Create a team of harvesters.
    #[must_use]
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            color: default_color(),
            roles: Vec::new(),
            reward_mode: RewardMode::Linear,
            brain: BrainKind::Rl,
        }
    }

    /// Set every agent's role.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    /// Set the shaping mode.
    #[must_use]
    pub fn with_reward_mode(mut self, mode: RewardMode) -> Self {
        self.reward_mode = mode;
        self
    }

    /// Set the display color.
    #[must_use]
    pub fn with_color(mut self, color: (u8, u8, u8)) -> Self {
        self.color = color;
        self
    }

    /// Role of the `index`-th agent of this team.
    #[must_use]
    pub fn role_of(&self, index: usize) -> Role {
        self.roles.get(index).copied().unwrap_or_default()
    }
}

/// Complete arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Grid width in cells.
    pub grid_width: i32,
    /// Grid height in cells.
    pub grid_height: i32,
    /// World units per cell; dynamic shaping divides distance deltas by it.
    pub cell_size: f32,
    /// Target number of food items on the grid.
    pub food_count: usize,
    /// Body length after (re)spawning.
    pub initial_length: usize,
    /// Hp lost by every agent each tick.
    pub hunger_decay: u32,
    /// Hp restored by eating.
    pub food_heal: u32,
    /// Starve after this many ticks without eating, regardless of hp.
    pub starvation_steps: Option<u32>,
    /// Random attempts per food placement before deferring to the next tick.
    pub food_attempts: u32,
    /// Random attempts per respawn before falling back to a full scan.
    pub respawn_attempts: u32,
    /// What feeds a team's current score and record.
    pub score_metric: ScoreMetric,
    /// Ticks per analytics interval (0 disables interval summaries).
    pub stats_interval: u64,
    /// Seed for the arena's RNG.
    pub seed: u64,
    /// Teams, in slot order.
    pub teams: Vec<TeamConfig>,
    /// Role table.
    pub roles: BTreeMap<Role, RoleConfig>,
    /// Reward table.
    pub rewards: BTreeMap<Role, RewardPreset>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            grid_width: 40,
            grid_height: 40,
            cell_size: 20.0,
            food_count: 6,
            initial_length: 3,
            hunger_decay: 1,
            food_heal: 30,
            starvation_steps: None,
            food_attempts: 100,
            respawn_attempts: 100,
            score_metric: ScoreMetric::FoodEaten,
            stats_interval: 1000,
            seed: 0,
            teams: vec![
                TeamConfig::new("Green Linear", 2)
                    .with_color((0, 180, 0))
                    .with_roles(vec![Role::Harvester, Role::Hunter]),
                TeamConfig::new("Blue Dynamic", 2)
                    .with_color((0, 0, 180))
                    .with_roles(vec![Role::Harvester, Role::Hunter])
                    .with_reward_mode(RewardMode::Dynamic),
            ],
            roles: Role::ALL
                .iter()
                .map(|&role| (role, RoleConfig::for_role(role)))
                .collect(),
            rewards: Role::ALL
                .iter()
                .map(|&role| (role, RewardPreset::for_role(role)))
                .collect(),
        }
    }
}

impl ArenaConfig {
    /// Parse a configuration from RON text. The result is not yet validated.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| ArenaError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Grid described by this configuration.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.grid_width, self.grid_height, self.cell_size)
    }

    /// Total number of agents across all teams.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.teams.iter().map(|t| t.count).sum()
    }

    /// Index of the team called `name`.
    #[must_use]
    pub fn team_index(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.name == name)
    }

    /// Role parameters, falling back to the built-in profile.
    #[must_use]
    pub fn role(&self, role: Role) -> RoleConfig {
        self.roles
            .get(&role)
            .copied()
            .unwrap_or_else(|| RoleConfig::for_role(role))
    }

    /// Reward preset for a role.
    ///
    /// A role without a preset uses the Harvester preset; with neither
    /// present every term is zero.
    #[must_use]
    pub fn reward_preset(&self, role: Role) -> &RewardPreset {
        self.rewards
            .get(&role)
            .or_else(|| self.rewards.get(&Role::default()))
            .unwrap_or(&ZERO_PRESET)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        let min_side = 2 * WALL_MARGIN + 1;
        if self.grid_width < min_side || self.grid_height < min_side {
            return Err(ArenaError::invalid(
                "grid",
                format!(
                    "grid must be at least {min_side}x{min_side}, got {}x{}",
                    self.grid_width, self.grid_height
                ),
            ));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ArenaError::invalid(
                "cell_size",
                format!("must be a positive number, got {}", self.cell_size),
            ));
        }
        if self.initial_length == 0 {
            return Err(ArenaError::invalid("initial_length", "must be at least 1"));
        }
        if self.food_attempts == 0 {
            return Err(ArenaError::invalid("food_attempts", "must be at least 1"));
        }
        if self.teams.is_empty() {
            return Err(ArenaError::invalid("teams", "at least one team is required"));
        }

        let mut names = BTreeSet::new();
        for team in &self.teams {
            if !names.insert(team.name.as_str()) {
                return Err(ArenaError::invalid(
                    "teams",
                    format!("duplicate team name '{}'", team.name),
                ));
            }
            if team.count == 0 {
                return Err(ArenaError::invalid(
                    "teams",
                    format!("team '{}' has no agents", team.name),
                ));
            }
            if !team.roles.is_empty() && team.roles.len() != team.count {
                return Err(ArenaError::invalid(
                    "teams",
                    format!(
                        "team '{}' lists {} roles for {} agents",
                        team.name,
                        team.roles.len(),
                        team.count
                    ),
                ));
            }
            for index in 0..team.count {
                let role = team.role_of(index);
                if !self.roles.contains_key(&role) {
                    return Err(ArenaError::UnknownRole {
                        team: team.name.clone(),
                        role,
                    });
                }
            }
        }

        for (role, cfg) in &self.roles {
            if cfg.max_hp == 0 {
                return Err(ArenaError::invalid(
                    "roles",
                    format!("{} has max_hp 0", role.name()),
                ));
            }
            if cfg.start_hp == 0 || cfg.start_hp > cfg.max_hp {
                return Err(ArenaError::invalid(
                    "roles",
                    format!(
                        "{} start_hp {} must be in 1..={}",
                        role.name(),
                        cfg.start_hp,
                        cfg.max_hp
                    ),
                ));
            }
        }

        let free_cells = self.grid().cell_count();
        let needed = self.agent_count() * self.initial_length;
        if needed >= free_cells {
            return Err(ArenaError::invalid(
                "teams",
                format!("{needed} body cells do not fit on a {free_cells}-cell grid"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_count(), 4);
        assert_eq!(config.team_index("Blue Dynamic"), Some(1));
    }

    #[test]
    fn test_unknown_role_fails_fast() {
        let mut config = ArenaConfig::default();
        config.roles.remove(&Role::Hunter);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::UnknownRole {
                role: Role::Hunter,
                ..
            })
        ));
    }

    #[test]
    fn test_role_count_mismatch_rejected() {
        let mut config = ArenaConfig::default();
        config.teams[0].roles = vec![Role::Hunter];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_team_rejected() {
        let mut config = ArenaConfig::default();
        config.teams[1].name = config.teams[0].name.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiny_grid_rejected() {
        let config = ArenaConfig {
            grid_width: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_start_hp_above_max_rejected() {
        let mut config = ArenaConfig::default();
        config.roles.insert(
            Role::Harvester,
            RoleConfig {
                start_hp: 200,
                ..RoleConfig::harvester()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_preset_falls_back_to_harvester() {
        let mut config = ArenaConfig::default();
        config.rewards.remove(&Role::Hunter);
        assert_eq!(
            *config.reward_preset(Role::Hunter),
            RewardPreset::harvester()
        );

        config.rewards.clear();
        assert_eq!(*config.reward_preset(Role::Hunter), RewardPreset::zero());
    }

    #[test]
    fn test_parse_partial_ron() {
        let ron = r#"
            ArenaConfig(
                grid_width: 20,
                grid_height: 15,
                teams: [
                    TeamConfig(
                        name: "Solo",
                        count: 2,
                        roles: [Hunter, Harvester],
                        reward_mode: Dynamic,
                    ),
                ],
                rewards: {
                    Harvester: RewardPreset(food: 3.0),
                },
            )
        "#;
        let config = ArenaConfig::from_ron_str(ron).unwrap();
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.food_count, 6);
        assert_eq!(config.teams[0].role_of(0), Role::Hunter);
        assert_eq!(config.teams[0].reward_mode, RewardMode::Dynamic);

        let preset = config.reward_preset(Role::Harvester);
        assert!((preset.food - 3.0).abs() < f32::EPSILON);
        assert!(preset.death.abs() < f32::EPSILON);
        // Hunter has no preset in this file.
        assert!((config.reward_preset(Role::Hunter).food - 3.0).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ArenaConfig::from_ron_str("ArenaConfig(grid_width: \"wide\")").unwrap_err();
        assert!(matches!(err, ArenaError::DataParseError { .. }));
    }
}
