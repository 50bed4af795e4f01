//! Error types for the arena simulation.

use thiserror::Error;

use crate::config::Role;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Top-level error type for all arena simulation errors.
///
/// Only construction and caller mistakes are errors. Collisions, starvation
/// and crowded placement are ordinary state transitions inside a tick.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// A configuration field failed validation.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A team assigns a role that has no entry in the role table.
    #[error("Team '{team}' references role {role:?} which has no role configuration")]
    UnknownRole {
        /// Team name.
        team: String,
        /// The unconfigured role.
        role: Role,
    },

    /// Team lookup by name failed.
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    /// Slot index outside the registry.
    #[error("Unknown agent slot: {0}")]
    UnknownSlot(usize),

    /// `step` received a different number of actions than there are agents.
    #[error("Expected {expected} actions (one per agent), got {actual}")]
    ActionCountMismatch {
        /// Number of agents in the arena.
        expected: usize,
        /// Number of actions supplied.
        actual: usize,
    },

    /// A relative turn index is not 0 (straight), 1 (right) or 2 (left).
    #[error("Invalid turn index {index} for slot {slot}; expected 0, 1 or 2")]
    InvalidTurn {
        /// Agent the turn was meant for.
        slot: usize,
        /// The rejected index.
        index: usize,
    },

    /// A scripted placement is not a legal body.
    #[error("Invalid placement for slot {slot}: {message}")]
    InvalidPlacement {
        /// Target slot.
        slot: usize,
        /// Reason the placement was rejected.
        message: String,
    },

    /// A scripted layout does not cover every slot exactly once.
    #[error("Layout lists {actual} bodies for {expected} agents")]
    LayoutMismatch {
        /// Number of agents in the arena.
        expected: usize,
        /// Number of bodies supplied.
        actual: usize,
    },

    /// No free cell could be found while building the initial arena.
    #[error("Could not find a free spawn location for slot {0}; the grid is too crowded")]
    SpawnExhausted(usize),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the input that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}

impl ArenaError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
