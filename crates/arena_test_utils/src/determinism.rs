//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the arena produces identical
//! results given an identical configuration, seed and action stream.
//!
//! # Testing Strategy
//!
//! Training runs and scenario replays rely on the engine being a pure
//! function of its inputs. Sources of non-determinism include:
//!
//! - **Unseeded randomness**: every spawn and food placement must draw from
//!   the arena's own seeded RNG.
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Snakes are iterated by slot and food lives in a sorted set.
//! - **Wall-clock time**: elapsed time is reported but never hashed or
//!   used by the simulation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic arena).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Arena is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use arena_core::prelude::*;
/// use arena_test_utils::determinism::verify_determinism;
/// use arena_test_utils::fixtures::straight_actions;
///
/// let result = verify_determinism(
///     3,
///     50,
///     || Arena::with_seed(ArenaConfig::default(), 11).unwrap(),
///     |arena| {
///         let actions = straight_actions(arena);
///         arena.step(&actions).unwrap();
///     },
///     Arena::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Drive an arena with a per-tick action function.
///
/// # Panics
///
/// Panics if `actions` returns the wrong number of directions.
pub fn run_arena<A>(arena: &mut Arena, ticks: u64, actions: A)
where
    A: Fn(&Arena, u64) -> Vec<Direction>,
{
    for tick in 0..ticks {
        let chosen = actions(arena, tick);
        arena
            .step(&chosen)
            .expect("action function returned one direction per agent");
    }
}

/// Run the same seeded arena twice with the same action function and
/// verify the final hashes match.
///
/// # Panics
///
/// Panics if `config` is invalid or `actions` returns the wrong number of
/// directions.
pub fn verify_arena_determinism<A>(config: &ArenaConfig, seed: u64, ticks: u64, actions: A) -> bool
where
    A: Fn(&Arena, u64) -> Vec<Direction>,
{
    let result = verify_determinism(
        2,
        1,
        || {
            Arena::with_seed(config.clone(), seed).expect("determinism check needs a valid config")
        },
        |arena| run_arena(arena, ticks, &actions),
        Arena::state_hash,
    );
    result.is_deterministic
}

/// Result of parallel arena runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks each run simulated.
    pub ticks: u64,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "Parallel arenas diverged after {} ticks: {:?}",
            self.ticks,
            self.hashes
        );
    }
}

/// Run N copies of a seeded arena on scoped threads and collect final hashes.
///
/// Catches hidden shared state (thread-locals, global RNGs) that a single
/// thread would not expose.
///
/// # Panics
///
/// Panics if the configuration is invalid or a worker thread panics.
pub fn run_parallel_arenas(config: &ArenaConfig, seed: u64, runs: usize, ticks: u64) -> ParallelRunResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut arena =
                        Arena::with_seed(config.clone(), seed).expect("config is valid");
                    run_arena(&mut arena, ticks, |a, tick| {
                        crate::fixtures::rotating_actions(a.snakes().len(), tick, 7)
                    });
                    arena.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("arena thread panicked"))
            .collect()
    });

    ParallelRunResult { hashes, ticks }
}

/// Compare two arena runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(tick)` if they diverge at that
/// tick (0 means the initial states already differ).
///
/// # Panics
///
/// Panics if `setup` yields arenas whose action count does not match.
pub fn find_first_divergence<Setup, A>(setup: Setup, ticks: u64, actions: A) -> Option<u64>
where
    Setup: Fn() -> Arena,
    A: Fn(&Arena, u64) -> Vec<Direction>,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        let a = actions(&first, tick - 1);
        let b = actions(&second, tick - 1);
        first.step(&a).expect("action count matches");
        second.step(&b).expect("action count matches");

        if first.state_hash() != second.state_hash() {
            tracing::warn!(tick, "Arenas diverged");
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for arena testing.
pub mod strategies {
    use arena_core::prelude::*;
    use proptest::prelude::*;

    /// Any absolute direction.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    /// Any relative turn.
    pub fn arb_turn() -> impl Strategy<Value = RelativeTurn> {
        prop_oneof![
            Just(RelativeTurn::Straight),
            Just(RelativeTurn::Right),
            Just(RelativeTurn::Left),
        ]
    }

    /// One tick of actions for `agents` snakes.
    pub fn arb_tick_actions(agents: usize) -> impl Strategy<Value = Vec<Direction>> {
        proptest::collection::vec(arb_direction(), agents)
    }

    /// Up to `max_ticks` ticks of actions for `agents` snakes.
    pub fn arb_action_sequence(
        agents: usize,
        max_ticks: usize,
    ) -> impl Strategy<Value = Vec<Vec<Direction>>> {
        proptest::collection::vec(arb_tick_actions(agents), 1..max_ticks.max(2))
    }

    /// A role.
    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Harvester), Just(Role::Hunter)]
    }

    /// A small valid configuration: one or two teams of one to three agents.
    pub fn arb_small_config() -> impl Strategy<Value = ArenaConfig> {
        (
            proptest::collection::vec(proptest::collection::vec(arb_role(), 1..4), 1..3),
            0usize..10,
            proptest::option::of(5u32..50),
        )
            .prop_map(|(teams, food_count, starvation_steps)| ArenaConfig {
                grid_width: 16,
                grid_height: 16,
                food_count,
                starvation_steps,
                teams: teams
                    .into_iter()
                    .enumerate()
                    .map(|(i, roles)| {
                        TeamConfig::new(format!("Team {i}"), roles.len()).with_roles(roles)
                    })
                    .collect(),
                ..Default::default()
            })
    }
}
