//! Headless arena driver for training runs and CI verification.
//!
//! This crate drives an [`arena_core::engine::Arena`] without a renderer:
//!
//! - **Learner bridge**: an external process steps the arena over JSON lines
//! - **Built-in strategies**: random, greedy and straight policies for smoke runs
//! - **Batch evaluation**: many seeds in parallel with aggregated team results
//! - **Determinism checks**: the same seed replayed must end in the same hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the learner (step, query, reset, etc.)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Serve the default scenario to a learner
//! echo '{"cmd":"step","actions":["up","up","left","left"]}' | cargo run -p arena_headless -- serve
//!
//! # Run the duel preset with greedy agents
//! cargo run -p arena_headless -- run --scenario duel --ticks 2000
//!
//! # Verify determinism
//! cargo run -p arena_headless -- verify --scenario scenarios/duel.ron --runs 5
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod strategies;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use protocol::{serve, Command, Response, Session};
pub use runner::{run_game, GameSummary, RunOptions};
pub use scenario::{Scenario, ScenarioError};
pub use strategies::{Policy, StrategyKind};
