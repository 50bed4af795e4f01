//! Team and global counters.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Per-team aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    /// Team name.
    pub name: String,
    /// Best current score ever observed.
    pub record: u32,
    /// Deaths of this team's agents.
    pub deaths: u64,
    /// Best score among the team's agents after the latest tick.
    pub current_score: u32,
    /// Evolutionary generation, advanced by the trainer. Starts at 1.
    pub generation: u32,
}

impl TeamStats {
    /// Fresh counters for a team.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record: 0,
            deaths: 0,
            current_score: 0,
            generation: 1,
        }
    }

    /// Set the current score and raise the record if it was beaten.
    /// Returns `true` on a new record.
    pub fn observe_score(&mut self, score: u32) -> bool {
        self.current_score = score;
        if score > self.record {
            self.record = score;
            return true;
        }
        false
    }
}

/// Arena-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Completed ticks.
    pub total_ticks: u64,
    /// Wall-clock seconds since the arena was built.
    pub elapsed_secs: f64,
    /// Deaths across all teams.
    pub total_deaths: u64,
}

/// Wall clock for [`GlobalStats::elapsed_secs`]. Never read by the
/// simulation itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    started: Instant,
}

impl Clock {
    pub(crate) fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
