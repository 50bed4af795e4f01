//! Test fixtures and helpers.
//!
//! Small, quiet arenas (no food, no hunger) where snakes are placed by hand,
//! so scenario tests can predict every tick exactly.

use arena_core::prelude::*;

/// Side length of fixture grids.
pub const FIXTURE_GRID: i32 = 20;

/// Build a body from `(x, y)` pairs, head first.
#[must_use]
pub fn points(cells: &[(i32, i32)]) -> Vec<Point> {
    cells.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

/// A 20x20 arena configuration with no food and no hunger.
#[must_use]
pub fn quiet_config(teams: Vec<TeamConfig>) -> ArenaConfig {
    ArenaConfig {
        grid_width: FIXTURE_GRID,
        grid_height: FIXTURE_GRID,
        food_count: 0,
        hunger_decay: 0,
        stats_interval: 0,
        teams,
        ..Default::default()
    }
}

/// One single-agent team per role, in order.
#[must_use]
pub fn one_per_team(roles: &[Role]) -> ArenaConfig {
    let teams = roles
        .iter()
        .enumerate()
        .map(|(i, &role)| TeamConfig::new(format!("Team {i}"), 1).with_roles(vec![role]))
        .collect();
    quiet_config(teams)
}

/// Replace the reward tables with presets that only pay event terms, so
/// every movement tick is worth exactly zero.
///
/// Harvester: food 15, death -10, starve -7, friendly fire -5.
/// Hunter: food 5, death -10, starve -7, kill 25, damage dealt 5.
pub fn event_only_rewards(config: &mut ArenaConfig) {
    config.rewards.insert(
        Role::Harvester,
        RewardPreset {
            food: 15.0,
            death: -10.0,
            starve: -7.0,
            friendly_fire: -5.0,
            ..RewardPreset::zero()
        },
    );
    config.rewards.insert(
        Role::Hunter,
        RewardPreset {
            food: 5.0,
            death: -10.0,
            starve: -7.0,
            friendly_fire: -5.0,
            kill_reward: 25.0,
            damage_dealt_reward: 5.0,
            ..RewardPreset::zero()
        },
    );
}

/// Build an arena and lay out every snake by hand.
///
/// # Panics
///
/// Panics if the configuration or the layout is invalid.
#[must_use]
pub fn scripted_arena(config: ArenaConfig, layout: &[(Vec<Point>, Direction)]) -> Arena {
    let mut arena = Arena::with_seed(config, 1).expect("fixture config is valid");
    arena.place_snakes(layout).expect("fixture layout is valid");
    arena
}

/// Every snake keeps its current heading.
#[must_use]
pub fn straight_actions(arena: &Arena) -> Vec<Direction> {
    arena.snakes().iter().map(|s| s.direction).collect()
}

/// Cycle through headings, offset per slot, changing every `period` ticks.
#[must_use]
pub fn rotating_actions(agents: usize, tick: u64, period: u64) -> Vec<Direction> {
    let phase = (tick / period.max(1)) as usize;
    (0..agents)
        .map(|slot| Direction::ALL[(phase + slot) % Direction::ALL.len()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_config_is_valid() {
        let config = one_per_team(&[Role::Harvester, Role::Hunter]);
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_count(), 2);
        assert_eq!(config.food_count, 0);
    }

    #[test]
    fn test_scripted_arena_places_bodies() {
        let arena = scripted_arena(
            one_per_team(&[Role::Harvester]),
            &[(points(&[(5, 5), (4, 5), (3, 5)]), Direction::Right)],
        );
        assert_eq!(arena.snakes()[0].head(), Some(Point::new(5, 5)));
        assert_eq!(straight_actions(&arena), vec![Direction::Right]);
    }

    #[test]
    fn test_rotating_actions_shift_per_slot() {
        let actions = rotating_actions(3, 0, 4);
        assert_eq!(actions, vec![Direction::Up, Direction::Right, Direction::Down]);
        assert_eq!(rotating_actions(1, 4, 4), vec![Direction::Right]);
    }
}
