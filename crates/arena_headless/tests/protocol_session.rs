//! Full JSON-lines sessions against an in-memory arena.

use std::io::Cursor;

use arena_core::prelude::*;
use arena_headless::protocol::{serve, Response, Session};
use arena_test_utils::fixtures::{event_only_rewards, one_per_team, points, scripted_arena};

fn wall_session() -> Session {
    let mut config = one_per_team(&[Role::Hunter, Role::Harvester]);
    event_only_rewards(&mut config);
    let arena = scripted_arena(
        config,
        &[
            (points(&[(5, 5), (4, 5), (3, 5)]), Direction::Right),
            (points(&[(10, 0), (10, 1), (10, 2)]), Direction::Up),
        ],
    );
    Session::new(arena)
}

fn run_session(session: &mut Session, input: &str) -> (u64, Vec<Response>) {
    let mut output = Vec::new();
    let processed = serve(session, Cursor::new(input), &mut output).unwrap();
    let text = String::from_utf8(output).unwrap();
    let responses = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (processed, responses)
}

#[test]
fn test_session_reports_wall_death() {
    let mut session = wall_session();
    let input = [
        r#"{"cmd":"step","actions":["right","up"]}"#,
        "this is not json",
        "",
        r#"{"cmd":"hash"}"#,
        r#"{"cmd":"query"}"#,
        r#"{"cmd":"quit"}"#,
        r#"{"cmd":"step","actions":["right","up"]}"#,
    ]
    .join("\n");

    let (processed, responses) = run_session(&mut session, &input);
    assert_eq!(processed, 5);
    assert_eq!(responses.len(), 6);

    match &responses[0] {
        Response::Ready {
            tick, agents, teams, ..
        } => {
            assert_eq!(*tick, 0);
            assert_eq!(*agents, 2);
            assert_eq!(teams, &vec!["Team 0".to_string(), "Team 1".to_string()]);
        }
        other => panic!("expected ready, got {other:?}"),
    }

    match &responses[1] {
        Response::Step {
            tick,
            results,
            events,
        } => {
            assert_eq!(*tick, 1);
            assert!(!results[0].done);
            assert!(results[1].done);
            assert!((results[1].reward + 10.0).abs() < 1e-4);
            assert_eq!(events.deaths.len(), 1);
            assert_eq!(events.deaths[0].slot, 1);
            assert_eq!(events.deaths[0].cause, DeathCause::Wall);
            assert_eq!(events.respawns.len(), 1);
        }
        other => panic!("expected step, got {other:?}"),
    }

    assert!(matches!(&responses[2], Response::Error { cmd: None, .. }));

    let hash = match &responses[3] {
        Response::StateHash { tick, hash } => {
            assert_eq!(*tick, 1);
            *hash
        }
        other => panic!("expected state hash, got {other:?}"),
    };

    match &responses[4] {
        Response::State { state, hash: h } => {
            assert_eq!(*h, hash);
            assert_eq!(state.tick, 1);
            assert_eq!(state.snakes[0].body[0], Point::new(6, 5));
            assert_eq!(state.global.total_deaths, 1);
        }
        other => panic!("expected state, got {other:?}"),
    }

    assert_eq!(responses[5], Response::Bye);
    assert_eq!(session.arena().tick(), 1);
}

#[test]
fn test_end_of_input_says_bye() {
    let mut session = wall_session();
    let (processed, responses) = run_session(&mut session, r#"{"cmd":"step_relative","turns":[0,1]}"#);
    assert_eq!(processed, 1);
    assert_eq!(responses.len(), 3);
    assert!(matches!(responses[1], Response::Step { tick: 1, .. }));
    assert_eq!(responses[2], Response::Bye);
}

#[test]
fn test_reset_restores_seeded_state() {
    let config = one_per_team(&[Role::Harvester, Role::Hunter]);
    let fresh = Arena::with_seed(config.clone(), 21).unwrap();
    let mut session = Session::new(Arena::with_seed(config, 3).unwrap());

    let input = [
        r#"{"cmd":"step","actions":["up","up"]}"#,
        r#"{"cmd":"reset","seed":21}"#,
        r#"{"cmd":"hash"}"#,
    ]
    .join("\n");
    let (_, responses) = run_session(&mut session, &input);

    assert!(matches!(
        &responses[2],
        Response::Ack { cmd, tick: 0 } if cmd == "reset"
    ));
    assert_eq!(
        responses[3],
        Response::StateHash {
            tick: 0,
            hash: fresh.state_hash()
        }
    );
}

#[test]
fn test_distances_command() {
    let mut session = wall_session();
    let (_, responses) = run_session(&mut session, r#"{"cmd":"distances"}"#);
    match &responses[1] {
        Response::Distances { agents } => {
            assert_eq!(agents.len(), 2);
            // No food in the quiet fixture; each snake sees the other as an enemy.
            assert!(agents[0].food.is_none());
            assert!(agents[0].enemy.is_some());
            assert!(agents[0].ally.is_none());
        }
        other => panic!("expected distances, got {other:?}"),
    }
}
