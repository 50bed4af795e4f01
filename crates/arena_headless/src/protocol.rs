//! JSON protocol for driving an arena from an external learner.
//!
//! The server communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the learner
//! **Output (stdout):** One response per command
//!
//! # Protocol Flow
//!
//! 1. Server starts, outputs `{"type":"ready",...}` with the agent count
//! 2. Learner sends one action per agent with `step` (absolute directions)
//!    or `step_relative` (turn indices: 0 straight, 1 right, 2 left)
//! 3. Server answers with per-agent rewards, done flags and tick events
//! 4. `quit` or end of input closes the session with `{"type":"bye"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"agents":2,"teams":["Red","Blue"]}
//! -> {"cmd":"step","actions":["up","left"]}
//! <- {"type":"step","tick":1,"results":[{"reward":-0.1,"done":false,"score":0},...],"events":{...}}
//! -> {"cmd":"step_relative","turns":[0,2]}
//! <- {"type":"step","tick":2,...}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":2,"hash":1234567890}
//! -> {"cmd":"reset","seed":7}
//! <- {"type":"ack","cmd":"reset","tick":0}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```

use std::io::{BufRead, Write};
use std::result::Result;

use arena_core::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Transport failures. Bad commands are answered with
/// [`Response::Error`] instead.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Reading or writing the stream failed.
    #[error("Protocol I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A response could not be encoded.
    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

// ============================================================================
// Input Commands (Learner -> Server)
// ============================================================================

/// Commands accepted by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance one tick with one absolute direction per agent.
    Step {
        /// Actions in slot order.
        actions: Vec<Direction>,
    },

    /// Advance one tick with one relative turn index per agent.
    StepRelative {
        /// Turn indices in slot order.
        turns: Vec<usize>,
    },

    /// Full state snapshot without advancing time.
    Query,

    /// State hash without advancing time.
    Hash,

    /// Per-agent distance features (food, enemy, ally).
    Distances,

    /// Rebuild the arena, optionally with a new seed.
    Reset {
        /// New seed. Keeps the current one when absent.
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Bump a team's generation counter.
    AdvanceGeneration {
        /// Team name.
        team: String,
    },

    /// End the session.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Command name for acknowledgments and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::StepRelative { .. } => "step_relative",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Distances => "distances",
            Self::Reset { .. } => "reset",
            Self::AdvanceGeneration { .. } => "advance_generation",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (Server -> Learner)
// ============================================================================

/// Responses written by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session start.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
        /// Number of agents (actions expected per step).
        agents: usize,
        /// Team names in configuration order.
        teams: Vec<String>,
    },

    /// Outcome of a step.
    Step {
        /// Tick after the step.
        tick: u64,
        /// Per-agent results in slot order.
        results: Vec<StepResult>,
        /// What happened during the tick.
        events: TickEvents,
    },

    /// Full state.
    State {
        /// Snapshot.
        state: GameState,
        /// State hash.
        hash: u64,
    },

    /// State hash only.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash.
        hash: u64,
    },

    /// Distance features in slot order.
    Distances {
        /// One entry per agent.
        agents: Vec<Distances>,
    },

    /// Generation counter after an advance.
    Generation {
        /// Team name.
        team: String,
        /// New generation.
        generation: u32,
    },

    /// Acknowledgment of a command with no other output.
    Ack {
        /// Command name.
        cmd: String,
        /// Tick after the command.
        tick: u64,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, when the line parsed.
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// An arena plus the command dispatch for one protocol session.
#[derive(Debug)]
pub struct Session {
    arena: Arena,
}

impl Session {
    /// Wrap an arena.
    #[must_use]
    pub fn new(arena: Arena) -> Self {
        Self { arena }
    }

    /// The arena being driven.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The ready message for this session.
    #[must_use]
    pub fn ready(&self) -> Response {
        Response::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick: self.arena.tick(),
            agents: self.arena.snakes().len(),
            teams: self
                .arena
                .config()
                .teams
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        }
    }

    /// Execute one command.
    pub fn handle(&mut self, command: Command) -> Response {
        let name = command.name();
        let outcome = match command {
            Command::Step { actions } => self.step(&actions),
            Command::StepRelative { turns } => self.step_relative(&turns),
            Command::Query => Ok(Response::State {
                state: self.arena.snapshot(),
                hash: self.arena.state_hash(),
            }),
            Command::Hash => Ok(Response::StateHash {
                tick: self.arena.tick(),
                hash: self.arena.state_hash(),
            }),
            Command::Distances => Ok(Response::Distances {
                agents: (0..self.arena.snakes().len())
                    .map(|slot| self.arena.distances(slot))
                    .collect(),
            }),
            Command::Reset { seed } => self.arena.reset(seed).map(|()| {
                info!(seed = self.arena.seed(), "Arena reset");
                Response::Ack {
                    cmd: name.to_string(),
                    tick: self.arena.tick(),
                }
            }),
            Command::AdvanceGeneration { team } => self
                .arena
                .advance_generation(&team)
                .map(|generation| Response::Generation { team, generation }),
            Command::Quit => Ok(Response::Bye),
        };

        outcome.unwrap_or_else(|e| {
            warn!(cmd = name, error = %e, "Command rejected");
            Response::error(e.to_string(), Some(name))
        })
    }

    fn step(&mut self, actions: &[Direction]) -> arena_core::error::Result<Response> {
        let results = self.arena.step(actions)?;
        Ok(self.step_response(results))
    }

    fn step_relative(&mut self, turns: &[usize]) -> arena_core::error::Result<Response> {
        let turns = turns
            .iter()
            .enumerate()
            .map(|(slot, &index)| {
                RelativeTurn::from_index(index).ok_or(ArenaError::InvalidTurn { slot, index })
            })
            .collect::<arena_core::error::Result<Vec<_>>>()?;
        let results = self.arena.step_relative(&turns)?;
        Ok(self.step_response(results))
    }

    fn step_response(&self, results: Vec<StepResult>) -> Response {
        Response::Step {
            tick: self.arena.tick(),
            results,
            events: self.arena.last_events().clone(),
        }
    }
}

fn write_line<W: Write>(writer: &mut W, response: &Response) -> Result<(), ProtocolError> {
    serde_json::to_writer(&mut *writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Serve a session until `quit` or end of input.
///
/// Returns the number of commands processed (blank lines excluded).
pub fn serve<R: BufRead, W: Write>(
    session: &mut Session,
    reader: R,
    mut writer: W,
) -> Result<u64, ProtocolError> {
    write_line(&mut writer, &session.ready())?;

    let mut processed = 0u64;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        processed += 1;

        let response = match Command::from_json(line) {
            Ok(command) => {
                debug!(cmd = command.name(), "Received command");
                session.handle(command)
            }
            Err(e) => Response::error(format!("Invalid command: {e}"), None),
        };
        let done = matches!(response, Response::Bye);
        write_line(&mut writer, &response)?;
        if done {
            return Ok(processed);
        }
    }

    write_line(&mut writer, &Response::Bye)?;
    Ok(processed)
}
