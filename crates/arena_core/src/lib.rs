//! # Arena Core
//!
//! Deterministic simulation core for a multi-agent snake arena.
//!
//! Teams of snakes move on a grid, eat food and fight according to their
//! role. Every tick produces one reward per agent for an external learner.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No policies or learners
//! - One seeded RNG for every random decision
//!
//! This separation enables:
//! - Headless training runs
//! - Reproducible scenarios from a seed
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Points, directions and grid bounds
//! - [`config`] - Roles, reward presets, teams and arena configuration
//! - [`snake`] - The snake entity and its health
//! - [`registry`] - Slot-indexed snakes plus the food set
//! - [`food`] / [`respawn`] - Placement managers
//! - [`combat`] - Move classification and body-contact resolution
//! - [`reward`] - Reward shaping
//! - [`engine`] - The turn stepper ([`Arena`](engine::Arena))
//! - [`analytics`] - Tick events and interval summaries
//! - [`snapshot`] - Read-only state projection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod analytics;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod food;
pub mod grid;
pub mod registry;
pub mod respawn;
pub mod reward;
pub mod rng;
pub mod snake;
pub mod snapshot;
pub mod stats;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        AnalyticsSink, DeathEvent, FoodEvent, IntervalStats, IntervalSummary, KillEvent,
        TickEvents,
    };
    pub use crate::config::{
        ArenaConfig, BrainKind, RewardMode, RewardPreset, Role, RoleConfig, ScoreMetric,
        TeamConfig,
    };
    pub use crate::engine::{Arena, StepResult};
    pub use crate::error::{ArenaError, Result};
    pub use crate::grid::{Direction, Grid, Point, RelativeTurn};
    pub use crate::reward::Distances;
    pub use crate::snake::{DeathCause, SlotId, Snake};
    pub use crate::snapshot::{GameState, SnakeView};
    pub use crate::stats::{GlobalStats, TeamStats};
}
