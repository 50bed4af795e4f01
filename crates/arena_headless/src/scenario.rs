//! Scenario loading and configuration.
//!
//! A scenario bundles an [`ArenaConfig`] with run parameters (tick count and
//! the built-in strategy driving every agent). Scenarios are RON files or one
//! of the named presets.

use std::path::Path;
use std::result::Result;

use arena_core::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategies::StrategyKind;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The arena configuration was rejected.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] ArenaError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Ticks per run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Strategy used for every agent by `run`, `batch` and `verify`.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Arena configuration.
    #[serde(default)]
    pub arena: ArenaConfig,
}

fn default_ticks() -> u64 {
    5_000
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            description: "Two mixed teams on the standard 40x40 arena".to_string(),
            ticks: default_ticks(),
            strategy: StrategyKind::Greedy,
            arena: ArenaConfig::default(),
        }
    }
}

impl Scenario {
    /// Names accepted by [`preset`](Self::preset).
    pub const PRESETS: [&'static str; 3] = ["default", "duel", "crowded"];

    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a preset name, falling back to a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::preset(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "duel" => Some(Self::duel()),
            "crowded" => Some(Self::crowded()),
            _ => None,
        }
    }

    /// One hunter against one harvester on a small grid.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "Hunter versus harvester on a 20x20 grid".to_string(),
            ticks: 2_000,
            strategy: StrategyKind::Greedy,
            arena: ArenaConfig {
                grid_width: 20,
                grid_height: 20,
                food_count: 3,
                stats_interval: 500,
                teams: vec![
                    TeamConfig::new("Red Hunter", 1)
                        .with_color((200, 0, 0))
                        .with_roles(vec![Role::Hunter]),
                    TeamConfig::new("Green Harvester", 1)
                        .with_color((0, 180, 0))
                        .with_reward_mode(RewardMode::Dynamic),
                ],
                ..ArenaConfig::default()
            },
        }
    }

    /// Four teams of four on the standard grid.
    #[must_use]
    pub fn crowded() -> Self {
        let mixed = vec![Role::Harvester, Role::Harvester, Role::Hunter, Role::Hunter];
        Self {
            name: "crowded".to_string(),
            description: "Sixteen agents competing for twelve food".to_string(),
            ticks: 5_000,
            strategy: StrategyKind::Greedy,
            arena: ArenaConfig {
                food_count: 12,
                teams: vec![
                    TeamConfig::new("Green", 4)
                        .with_color((0, 180, 0))
                        .with_roles(mixed.clone()),
                    TeamConfig::new("Blue", 4)
                        .with_color((0, 0, 180))
                        .with_roles(mixed.clone())
                        .with_reward_mode(RewardMode::Dynamic),
                    TeamConfig::new("Red", 4)
                        .with_color((200, 0, 0))
                        .with_roles(mixed.clone()),
                    TeamConfig::new("Yellow", 4)
                        .with_color((200, 200, 0))
                        .with_roles(mixed)
                        .with_reward_mode(RewardMode::Dynamic),
                ],
                ..ArenaConfig::default()
            },
        }
    }

    /// Check the arena configuration without building an arena.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.arena.validate()?;
        Ok(())
    }

    /// Build an arena for this scenario seeded with `seed`.
    pub fn build_arena(&self, seed: u64) -> Result<Arena, ScenarioError> {
        Ok(Arena::with_seed(self.arena.clone(), seed)?)
    }

    /// Names of the configured teams, in slot order.
    #[must_use]
    pub fn team_names(&self) -> Vec<String> {
        self.arena.teams.iter().map(|t| t.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.arena.teams.len(), 2);
        assert_eq!(scenario.arena.agent_count(), 4);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for name in Scenario::PRESETS {
            let scenario = Scenario::preset(name).unwrap();
            assert_eq!(scenario.name, name);
            assert!(scenario.validate().is_ok(), "preset {name} is invalid");
        }
        assert!(Scenario::preset("missing").is_none());
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                ticks: 50,
                strategy: Random,
                arena: (
                    grid_width: 16,
                    grid_height: 16,
                    teams: [
                        (name: "A", count: 1),
                        (name: "B", count: 2, roles: [Hunter, Harvester], reward_mode: Dynamic),
                    ],
                ),
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.ticks, 50);
        assert_eq!(scenario.strategy, StrategyKind::Random);
        assert_eq!(scenario.arena.grid_width, 16);
        assert_eq!(scenario.arena.food_count, 6);
        assert_eq!(scenario.arena.teams[1].role_of(0), Role::Hunter);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let scenario = Scenario::from_ron_str(r#"Scenario(name: "bare")"#).unwrap();
        assert_eq!(scenario.ticks, 5_000);
        assert_eq!(scenario.strategy, StrategyKind::Greedy);
        assert_eq!(scenario.arena, ArenaConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_arena_rejected() {
        let mut scenario = Scenario::duel();
        scenario.arena.grid_width = 0;
        assert!(matches!(
            scenario.build_arena(1),
            Err(ScenarioError::Invalid(_))
        ));
    }
}
