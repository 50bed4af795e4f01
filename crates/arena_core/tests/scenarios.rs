//! End-to-end tick scenarios on hand-placed arenas.

use arena_core::prelude::*;
use arena_test_utils::fixtures::{
    event_only_rewards, one_per_team, points, quiet_config, scripted_arena, straight_actions,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn test_self_collision_reports_death_and_respawns() {
    let mut config = one_per_team(&[Role::Harvester]);
    event_only_rewards(&mut config);
    let mut arena = scripted_arena(
        config,
        &[(
            points(&[(8, 8), (8, 9), (9, 9), (9, 8), (9, 7)]),
            Direction::Up,
        )],
    );

    // Turning right runs into segment 3.
    let results = arena.step(&[Direction::Right]).unwrap();
    assert!(results[0].done);
    assert!(approx(results[0].reward, -10.0));

    let state = arena.snapshot();
    let snake = &state.snakes[0];
    assert!(snake.alive);
    assert_eq!(snake.body.len(), 3);
    assert!(arena.grid().is_interior(snake.body[0]));
    assert_eq!(state.global.total_deaths, 1);
    assert_eq!(
        arena.last_events().deaths[0].cause,
        DeathCause::SelfCollision
    );
}

#[test]
fn test_hunter_cuts_short_enemy_and_collects_kill() {
    let mut config = one_per_team(&[Role::Hunter, Role::Harvester]);
    event_only_rewards(&mut config);
    let mut arena = scripted_arena(
        config,
        &[
            (points(&[(10, 10), (9, 10), (8, 10)]), Direction::Right),
            (points(&[(11, 10)]), Direction::Up),
        ],
    );

    let results = arena.step(&[Direction::Right, Direction::Up]).unwrap();
    assert!(!results[0].done);
    assert!(approx(results[0].reward, 25.0 + 5.0));
    assert!(results[1].done);
    assert!(approx(results[1].reward, -10.0));

    let hunter = &arena.snakes()[0];
    assert_eq!(hunter.head(), Some(Point::new(11, 10)));
    assert_eq!(hunter.len(), 3);
    assert_eq!(arena.team_stats()[1].deaths, 1);
    assert_eq!(arena.live_count(), 2);
}

#[test]
fn test_mutual_kill_ends_both_agents_in_one_tick() {
    let mut config = one_per_team(&[Role::Hunter, Role::Hunter]);
    config.roles.insert(
        Role::Hunter,
        RoleConfig {
            self_damage: 50,
            ..RoleConfig::hunter()
        },
    );
    event_only_rewards(&mut config);
    let mut arena = scripted_arena(
        config,
        &[
            (points(&[(9, 10), (8, 10)]), Direction::Right),
            (points(&[(10, 9), (10, 10), (10, 11)]), Direction::Up),
        ],
    );
    arena.set_hp(0, 30).unwrap();
    arena.set_hp(1, 40).unwrap();

    // Slot 0 deals 40 and takes 50: both hit zero in the same exchange.
    let results = arena.step(&[Direction::Right, Direction::Up]).unwrap();
    assert!(results[0].done);
    assert!(results[1].done);
    // Damage 5 + kill 25, then its own death -10.
    assert!(approx(results[0].reward, 20.0));
    // Kill 25 staged on contact plus the death -10 carried over the respawn.
    assert!(approx(results[1].reward, 15.0));

    let events = arena.last_events();
    assert_eq!(
        events.kills,
        vec![
            KillEvent { killer: 0, victim: 1 },
            KillEvent { killer: 1, victim: 0 },
        ]
    );
    assert_eq!(events.deaths.len(), 2);
    assert!(events
        .deaths
        .iter()
        .all(|d| d.cause == DeathCause::EnemyCollision));
    assert_eq!(arena.live_count(), 2);
    assert_eq!(arena.team_stats()[0].deaths, 1);
    assert_eq!(arena.team_stats()[1].deaths, 1);
}

#[test]
fn test_hunter_truncates_long_enemy_without_killing() {
    let mut config = one_per_team(&[Role::Hunter, Role::Harvester]);
    event_only_rewards(&mut config);
    let mut arena = scripted_arena(
        config,
        &[
            (points(&[(10, 10), (9, 10)]), Direction::Right),
            (
                points(&[(11, 8), (11, 9), (11, 10), (11, 11), (11, 12)]),
                Direction::Up,
            ),
        ],
    );

    let results = arena.step(&[Direction::Right, Direction::Up]).unwrap();
    assert!(!results[0].done);
    assert!(approx(results[0].reward, 5.0));
    assert!(!results[1].done);

    let victim = &arena.snakes()[1];
    // Cut at segment 2, then moved up one cell.
    assert_eq!(victim.len(), 2);
    assert_eq!(victim.head(), Some(Point::new(11, 7)));
    assert_eq!(victim.hp(), 60);
    assert_eq!(arena.snakes()[0].head(), Some(Point::new(11, 10)));
}

#[test]
fn test_food_grows_heals_and_is_replaced() {
    let mut config = one_per_team(&[Role::Harvester]);
    config.food_count = 3;
    config.hunger_decay = 2;
    event_only_rewards(&mut config);
    let mut arena = scripted_arena(
        config,
        &[(points(&[(6, 6), (5, 6), (4, 6)]), Direction::Right)],
    );
    arena.set_food([Point::new(7, 6), Point::new(1, 1), Point::new(18, 18)]);
    arena.set_hp(0, 90).unwrap();

    let results = arena.step(&[Direction::Right]).unwrap();
    assert!(approx(results[0].reward, 15.0));
    assert_eq!(results[0].score, 1);

    let snake = &arena.snakes()[0];
    assert_eq!(snake.len(), 4);
    assert_eq!(snake.hp(), 100);
    assert_eq!(arena.food_count(), 3);
    assert!(arena.foods().all(|f| f != Point::new(7, 6)));
    assert_eq!(arena.last_events().food[0].at, Point::new(7, 6));
}

#[test]
fn test_straight_run_keeps_length() {
    let mut arena = scripted_arena(
        one_per_team(&[Role::Hunter]),
        &[(points(&[(3, 3), (3, 2), (3, 1)]), Direction::Down)],
    );
    let n = 12;
    for _ in 0..n {
        let actions = straight_actions(&arena);
        assert!(!arena.step(&actions).unwrap()[0].done);
    }
    let snake = &arena.snakes()[0];
    assert_eq!(snake.len(), 3);
    assert_eq!(snake.steps_alive, n);
    assert_eq!(snake.head(), Some(Point::new(3, 15)));
}

#[test]
fn test_tie_break_follows_slot_order() {
    let mut config = quiet_config(vec![
        TeamConfig::new("First", 1),
        TeamConfig::new("Second", 1),
    ]);
    event_only_rewards(&mut config);
    let mut arena = scripted_arena(
        config,
        &[
            (points(&[(10, 4), (10, 3)]), Direction::Down),
            (points(&[(10, 6), (10, 7)]), Direction::Up),
        ],
    );

    let results = arena.step(&[Direction::Down, Direction::Up]).unwrap();
    assert!(!results[0].done, "slot 0 reaches the contested cell first");
    assert!(results[1].done, "slot 1 runs into slot 0");
    assert_eq!(arena.snakes()[0].head(), Some(Point::new(10, 5)));
}

#[test]
fn test_interval_stats_from_arena_events() {
    let mut config = one_per_team(&[Role::Harvester]);
    config.stats_interval = 2;
    let mut arena = scripted_arena(
        config,
        &[(points(&[(18, 5), (17, 5), (16, 5)]), Direction::Right)],
    );
    arena.set_food([Point::new(19, 5)]);
    let names = arena
        .config()
        .teams
        .iter()
        .map(|t| t.name.clone())
        .collect();
    let mut stats = IntervalStats::new(names, arena.config().stats_interval);

    // Eat at the edge, then run into the wall.
    arena.step(&[Direction::Right]).unwrap();
    assert!(stats.observe(arena.last_events()).is_none());
    arena.step(&[Direction::Right]).unwrap();
    let summary = stats.observe(arena.last_events()).unwrap();

    assert_eq!(summary.tick, 2);
    let team = &summary.teams[0];
    assert_eq!(team.food, 1);
    assert_eq!(team.deaths, 1);
    assert_eq!(team.causes.wall, 1);
}
