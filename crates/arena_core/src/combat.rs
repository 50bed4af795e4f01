//! Move classification and body-contact resolution.
//!
//! A predicted head is classified in a fixed priority order: out of bounds,
//! food, body contact, plain move. Contact with another snake is resolved
//! from the mover's point of view:
//!
//! - A mover whose role is not `collision_survivable` always dies. Hitting a
//!   teammate stages `friendly_fire` for the mover; hitting an enemy stages
//!   the occupant's `kill_reward` for the occupant.
//! - A survivable mover trades damage: the occupant loses the mover's
//!   `damage_dealt`, the mover loses the occupant's `self_damage`. If both
//!   are still alive the occupant is cut at the contact segment.
//! - When both die in the same exchange each side is credited for the other
//!   (enemy teams only). Kill credit never depends on evaluation order.
//!
//! Rewards are only staged into `pending_reward` here. Deaths are reported
//! back to the stepper, which owns counters, events and respawns.

use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::grid::{Grid, Point};
use crate::registry::{EntityRegistry, Occupant};
use crate::snake::{DeathCause, SlotId};

/// What a predicted head position means for the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Outside the grid.
    Wall,
    /// On a food cell.
    Food,
    /// On a live body segment (possibly the mover's own).
    Encounter(Occupant),
    /// Nothing there.
    Clear,
}

/// Classify the cell `head` is about to enter.
#[must_use]
pub fn classify(grid: &Grid, registry: &EntityRegistry, head: Point) -> MoveOutcome {
    if !grid.contains(head) {
        return MoveOutcome::Wall;
    }
    if registry.has_food(head) {
        return MoveOutcome::Food;
    }
    match registry.occupant_at(head) {
        Some(occupant) => MoveOutcome::Encounter(occupant),
        None => MoveOutcome::Clear,
    }
}

/// Result of one body contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncounterReport {
    /// Set if the mover died.
    pub mover_death: Option<DeathCause>,
    /// The other snake, `None` on self-collision.
    pub occupant: Option<SlotId>,
    /// Whether the occupant died (hp exhausted or body cut away).
    pub occupant_died: bool,
    /// Hp actually removed from the occupant.
    pub damage_dealt: u32,
    /// Hp actually removed from the mover.
    pub damage_taken: u32,
    /// Segments cut from the occupant.
    pub segments_cut: usize,
}

/// Resolve `mover` running into `contact`.
///
/// Mutates hp, bodies and pending rewards of both parties but does not kill,
/// move or respawn anyone.
pub fn resolve_encounter(
    registry: &mut EntityRegistry,
    config: &ArenaConfig,
    mover: SlotId,
    contact: Occupant,
) -> EncounterReport {
    if contact.slot == mover {
        return EncounterReport {
            mover_death: Some(DeathCause::SelfCollision),
            ..Default::default()
        };
    }
    let Some((attacker, victim)) = registry.pair_mut(mover, contact.slot) else {
        return EncounterReport::default();
    };

    let same_team = attacker.team == victim.team;
    let attacker_stats = config.role(attacker.role);
    let victim_stats = config.role(victim.role);
    let attacker_preset = config.reward_preset(attacker.role);
    let victim_preset = config.reward_preset(victim.role);

    let mut report = EncounterReport {
        occupant: Some(victim.slot),
        ..Default::default()
    };

    if !attacker_stats.collision_survivable {
        if same_team {
            attacker.pending_reward += attacker_preset.friendly_fire;
        } else {
            victim.pending_reward += victim_preset.kill_reward;
        }
        report.mover_death = Some(DeathCause::EnemyCollision);
        return report;
    }

    report.damage_dealt = victim.health.apply_damage(attacker_stats.damage_dealt);
    report.damage_taken = attacker.health.apply_damage(victim_stats.self_damage);
    if same_team {
        attacker.pending_reward += attacker_preset.friendly_fire;
    } else if report.damage_dealt > 0 {
        attacker.pending_reward += attacker_preset.damage_dealt_reward;
    }

    let attacker_alive = !attacker.health.is_dead();
    if attacker_alive && !victim.health.is_dead() {
        report.segments_cut = victim.truncate_at(contact.segment);
        let bonus = victim.len().saturating_sub(config.initial_length);
        victim.score = u32::try_from(bonus).unwrap_or(u32::MAX);
    }

    report.occupant_died = victim.health.is_dead() || victim.is_empty();
    if report.occupant_died && !same_team {
        attacker.pending_reward += attacker_preset.kill_reward;
    }
    if !attacker_alive {
        report.mover_death = Some(DeathCause::EnemyCollision);
        if !same_team {
            victim.pending_reward += victim_preset.kill_reward;
        }
    }

    tracing::trace!(
        mover,
        occupant = contact.slot,
        segment = contact.segment,
        dealt = report.damage_dealt,
        taken = report.damage_taken,
        cut = report.segments_cut,
        "Body contact resolved"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RewardMode, Role, RoleConfig};
    use crate::grid::Direction;
    use crate::snake::Snake;

    fn snake(slot: SlotId, team: usize, role: Role, cells: &[(i32, i32)]) -> Snake {
        let stats = RoleConfig::for_role(role);
        let mut s = Snake::new(slot, team, role, RewardMode::Linear, stats);
        s.respawn(
            cells.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            Direction::Right,
            stats,
        );
        s
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_classify_priority() {
        let grid = Grid::new(10, 10, 1.0);
        let mut reg = EntityRegistry::new(vec![snake(0, 0, Role::Harvester, &[(3, 3), (2, 3)])]);
        reg.insert_food(Point::new(5, 5));

        assert_eq!(classify(&grid, &reg, Point::new(-1, 3)), MoveOutcome::Wall);
        assert_eq!(classify(&grid, &reg, Point::new(5, 5)), MoveOutcome::Food);
        assert_eq!(
            classify(&grid, &reg, Point::new(2, 3)),
            MoveOutcome::Encounter(Occupant { slot: 0, segment: 1 })
        );
        assert_eq!(classify(&grid, &reg, Point::new(7, 7)), MoveOutcome::Clear);
    }

    #[test]
    fn test_self_contact_is_self_collision() {
        let config = ArenaConfig::default();
        let mut reg = EntityRegistry::new(vec![snake(
            0,
            0,
            Role::Hunter,
            &[(3, 3), (4, 3), (4, 4), (3, 4)],
        )]);
        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 0, segment: 3 });
        assert_eq!(report.mover_death, Some(DeathCause::SelfCollision));
        assert_eq!(reg.get(0).unwrap().hp(), 150);
    }

    #[test]
    fn test_harvester_into_enemy_credits_occupant() {
        let config = ArenaConfig::default();
        let mut reg = EntityRegistry::new(vec![
            snake(0, 0, Role::Harvester, &[(3, 3), (2, 3)]),
            snake(1, 1, Role::Hunter, &[(4, 2), (4, 3), (4, 4)]),
        ]);
        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 1, segment: 1 });
        assert_eq!(report.mover_death, Some(DeathCause::EnemyCollision));
        assert!(!report.occupant_died);
        assert_eq!(reg.get(1).unwrap().len(), 3);
        assert!(approx(
            reg.get(1).unwrap().pending_reward,
            config.reward_preset(Role::Hunter).kill_reward
        ));
        assert!(approx(reg.get(0).unwrap().pending_reward, 0.0));
    }

    #[test]
    fn test_harvester_into_teammate_is_friendly_fire() {
        let config = ArenaConfig::default();
        let mut reg = EntityRegistry::new(vec![
            snake(0, 0, Role::Harvester, &[(3, 3), (2, 3)]),
            snake(1, 0, Role::Hunter, &[(4, 2), (4, 3), (4, 4)]),
        ]);
        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 1, segment: 1 });
        assert_eq!(report.mover_death, Some(DeathCause::EnemyCollision));
        assert!(approx(
            reg.get(0).unwrap().pending_reward,
            config.reward_preset(Role::Harvester).friendly_fire
        ));
        assert!(approx(reg.get(1).unwrap().pending_reward, 0.0));
    }

    #[test]
    fn test_hunter_truncates_enemy() {
        let config = ArenaConfig::default();
        let mut reg = EntityRegistry::new(vec![
            snake(0, 0, Role::Hunter, &[(3, 3), (2, 3)]),
            snake(
                1,
                1,
                Role::Harvester,
                &[(4, 1), (4, 2), (4, 3), (4, 4), (4, 5)],
            ),
        ]);
        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 1, segment: 2 });

        assert_eq!(report.mover_death, None);
        assert!(!report.occupant_died);
        assert_eq!(report.segments_cut, 3);
        assert_eq!(report.damage_dealt, 40);
        assert_eq!(report.damage_taken, 10);

        let victim = reg.get(1).unwrap();
        assert_eq!(victim.len(), 2);
        assert_eq!(victim.hp(), 60);
        assert_eq!(victim.score, 0);
        assert_eq!(reg.get(0).unwrap().hp(), 140);
        assert!(approx(
            reg.get(0).unwrap().pending_reward,
            config.reward_preset(Role::Hunter).damage_dealt_reward
        ));
    }

    #[test]
    fn test_hunter_kills_single_segment_enemy() {
        let config = ArenaConfig::default();
        let mut reg = EntityRegistry::new(vec![
            snake(0, 0, Role::Hunter, &[(3, 3), (2, 3)]),
            snake(1, 1, Role::Harvester, &[(4, 3)]),
        ]);
        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 1, segment: 0 });

        assert!(report.occupant_died);
        assert_eq!(report.mover_death, None);
        assert!(reg.get(1).unwrap().is_empty());
        let preset = config.reward_preset(Role::Hunter);
        assert!(approx(
            reg.get(0).unwrap().pending_reward,
            preset.damage_dealt_reward + preset.kill_reward
        ));
    }

    #[test]
    fn test_double_death_credits_both() {
        let mut config = ArenaConfig::default();
        // Counter damage lethal to a hunter at 30 hp.
        config.roles.insert(
            Role::Hunter,
            RoleConfig {
                self_damage: 50,
                ..RoleConfig::hunter()
            },
        );
        let mut reg = EntityRegistry::new(vec![
            snake(0, 0, Role::Hunter, &[(3, 3), (2, 3)]),
            snake(1, 1, Role::Hunter, &[(4, 2), (4, 3), (4, 4)]),
        ]);
        reg.get_mut(0).unwrap().health.current = 30;
        reg.get_mut(1).unwrap().health.current = 40;

        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 1, segment: 1 });
        assert_eq!(report.mover_death, Some(DeathCause::EnemyCollision));
        assert!(report.occupant_died);
        assert_eq!(report.segments_cut, 0);

        let preset = config.reward_preset(Role::Hunter);
        assert!(approx(
            reg.get(0).unwrap().pending_reward,
            preset.damage_dealt_reward + preset.kill_reward
        ));
        assert!(approx(reg.get(1).unwrap().pending_reward, preset.kill_reward));
    }

    #[test]
    fn test_attacker_killed_by_counter_damage_leaves_victim_whole() {
        let mut config = ArenaConfig::default();
        config.roles.insert(
            Role::Harvester,
            RoleConfig {
                self_damage: 500,
                ..RoleConfig::harvester()
            },
        );
        let mut reg = EntityRegistry::new(vec![
            snake(0, 0, Role::Hunter, &[(3, 3), (2, 3)]),
            snake(1, 1, Role::Harvester, &[(4, 2), (4, 3), (4, 4)]),
        ]);
        let report = resolve_encounter(&mut reg, &config, 0, Occupant { slot: 1, segment: 1 });
        assert_eq!(report.mover_death, Some(DeathCause::EnemyCollision));
        assert!(!report.occupant_died);
        assert_eq!(reg.get(1).unwrap().len(), 3);
        assert_eq!(reg.get(1).unwrap().hp(), 60);
    }
}
