//! End-to-end match behavior.
//!
//! These tests drive whole matches through [`Simulation::step`] and check the
//! properties that only show up across stages: ending and ranking, snapshot
//! cadence and contents, disconnect handling, and per-tick invariants.

use glam::Vec2;
use proptest::prelude::*;

use crate::config::Tuning;
use crate::entity::{AbilityFlags, ConnectionId, PlayerId};
use crate::hazard::HazardKind;
use crate::output::Output;
use crate::simulation::Simulation;

use super::helpers::{quiet_tuning, roster, run_to_end};

fn end_count(outputs: &[Output]) -> usize {
    outputs.iter().filter(|output| output.as_end().is_some()).count()
}

/// Tuning with every hazard on a short fuse.
fn busy_tuning() -> Tuning {
    Tuning {
        meteor_interval_ticks: 20,
        fire_interval_ticks: 30,
        fire_duration_ticks: 40,
        item_spawn_interval_ticks: 10,
        shrink_start_ticks: 60,
        shrink_step_ticks: 40,
        shrink_warning_ticks: 20,
        ..Tuning::default()
    }
}

// =============================================================================
// Ending and ranking
// =============================================================================

#[test]
fn two_player_duel_ranks_survivor_first() {
    let mut sim = Simulation::with_tuning(&roster(2), quiet_tuning(), 8).unwrap();
    {
        let arena = sim.arena_mut();
        let striker = arena.player_mut(PlayerId::new(1)).unwrap();
        striker.position = Vec2::new(150.0, 150.0);
        striker.combat.attack_damage = 20_000.0;
        arena.player_mut(PlayerId::new(2)).unwrap().position = Vec2::new(156.0, 150.0);
    }

    let outputs = run_to_end(&mut sim, 200);

    assert!(sim.is_ended());
    assert_eq!(end_count(&outputs), 1);
    let result = outputs.iter().find_map(Output::as_end).unwrap();
    assert_eq!(result.ranking.len(), 2);

    let first = &result.ranking[0];
    assert_eq!((first.position, first.player_id), (1, PlayerId::new(1)));
    assert_eq!(first.death_tick, None);
    assert!(first.hp > 0.0);

    let second = &result.ranking[1];
    assert_eq!((second.position, second.player_id), (2, PlayerId::new(2)));
    assert_eq!(second.death_tick, Some(sim.tick()));
    assert_eq!(second.hp, 0.0);
}

#[test]
fn full_match_ends_exactly_once() {
    let mut sim = Simulation::new(&roster(6), 77);

    let outputs = run_to_end(&mut sim, 200_000);

    assert!(sim.is_ended());
    assert_eq!(end_count(&outputs), 1);
    assert!(matches!(outputs.last(), Some(Output::End(_))));
    assert!(matches!(outputs.iter().rev().nth(1), Some(Output::Snapshot(_))));

    let result = outputs.iter().find_map(Output::as_end).unwrap();
    assert_eq!(result.ranking.len(), 6);
    assert_eq!(result.ranking[0].position, 1);
    assert!(result.ranking.windows(2).all(|pair| pair[0].position <= pair[1].position));
    assert!(result.ranking.iter().filter(|entry| entry.death_tick.is_none()).count() <= 1);

    assert!(sim.step().is_empty());
}

#[test]
fn removing_second_to_last_player_ends_match() {
    let mut sim = Simulation::new(&roster(3), 4);
    for _ in 0..5 {
        sim.step();
    }

    assert!(sim.remove_player(&ConnectionId::from("c2")).is_empty());
    let outputs = sim.remove_player(&ConnectionId::from("c3"));

    assert_eq!(outputs.len(), 2);
    let final_snapshot = outputs[0].as_snapshot().unwrap();
    assert_eq!(final_snapshot.tick, 5);
    assert_eq!(final_snapshot.players.len(), 1);
    assert_eq!(end_count(&outputs), 1);

    assert!(sim.step().is_empty());
    assert!(sim.remove_player(&ConnectionId::from("c1")).is_empty());
    assert!(sim.remove_player(&ConnectionId::from("c3")).is_empty());
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn snapshots_every_other_tick() {
    let mut sim = Simulation::new(&roster(5), 12);

    for expected_tick in 1..=20 {
        let outputs = sim.step();
        let snapshot = outputs.iter().find_map(Output::as_snapshot);
        if expected_tick % 2 == 0 {
            assert_eq!(snapshot.map(|s| s.tick), Some(expected_tick));
        } else {
            assert!(snapshot.is_none());
        }
    }
}

#[test]
fn snapshots_never_show_expired_entries() {
    let mut sim = Simulation::with_tuning(&roster(10), busy_tuning(), 31).unwrap();
    let mut saw_hazard = false;

    for _ in 0..400 {
        for output in sim.step() {
            let Some(snapshot) = output.as_snapshot() else {
                continue;
            };
            saw_hazard |= !snapshot.hazards.is_empty();
            for hazard in &snapshot.hazards {
                assert_ne!(hazard.ttl_ticks, Some(0), "hazard {} at tick {}", hazard.id, snapshot.tick);
            }
            for item in &snapshot.items {
                assert!(item.ttl_ticks > 0, "item {} at tick {}", item.id, snapshot.tick);
            }
        }
        if sim.is_ended() {
            break;
        }
    }

    assert!(saw_hazard);
}

#[test]
fn ring_cells_warn_then_burn_forever() {
    let tuning = Tuning {
        snapshot_every_ticks: 1,
        shrink_start_ticks: 10,
        shrink_warning_ticks: 5,
        ..quiet_tuning()
    };
    let mut sim = Simulation::with_tuning(&roster(2), tuning, 3).unwrap();

    let mut at = |target: u64| loop {
        let outputs = sim.step();
        if sim.tick() == target {
            return outputs
                .into_iter()
                .find_map(|output| output.as_snapshot().cloned())
                .unwrap();
        }
    };

    let warning = at(10);
    assert!(!warning.hazards.is_empty());
    assert!(warning
        .hazards
        .iter()
        .all(|h| h.kind == HazardKind::Meteor && h.ttl_ticks == Some(5)));

    let burning = at(15);
    assert!(burning
        .hazards
        .iter()
        .all(|h| h.kind == HazardKind::Fire && h.ttl_ticks.is_none()));
    assert_eq!(burning.hazards.len(), warning.hazards.len());
}

#[test]
fn pickup_events_are_delivered_once() {
    let tuning = Tuning {
        item_spawn_interval_ticks: 2,
        ..quiet_tuning()
    };
    let mut sim = Simulation::with_tuning(&roster(8), tuning, 19).unwrap();
    let mut seen = Vec::new();

    for _ in 0..600 {
        for output in sim.step() {
            if let Some(snapshot) = output.as_snapshot() {
                seen.extend(snapshot.pickup_events.iter().map(|event| event.id));
            }
        }
    }

    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}

// =============================================================================
// Invariants
// =============================================================================

/// Steps `sim` up to `ticks` times, checking per-tick invariants after every
/// step.
fn check_invariants(sim: &mut Simulation, ticks: u64) {
    let mut was_alive: Vec<(PlayerId, bool, AbilityFlags)> = sim
        .arena()
        .players()
        .map(|p| (p.id, p.alive, p.abilities))
        .collect();

    for _ in 0..ticks {
        sim.step();
        let arena = sim.arena();

        for player in arena.players() {
            if player.alive {
                assert!(player.vitals.hp > 0.0, "{} hp {}", player.id, player.vitals.hp);
                assert!(player.vitals.hp <= player.vitals.max_hp);
                assert!(arena.in_bounds(player.position), "{} at {}", player.id, player.position);
            } else {
                assert_eq!(player.vitals.hp, 0.0);
                assert!(player.death_tick.is_some());
            }
            assert!(player.vitals.shield >= 0.0);
        }

        for (id, alive, abilities) in &mut was_alive {
            let Some(player) = arena.player(*id) else {
                continue;
            };
            assert!(*alive || !player.alive, "{id} came back to life");
            assert!(player.abilities.contains(*abilities), "{id} regained an ability");
            *alive = player.alive;
            *abilities = player.abilities;
        }

        if sim.is_ended() {
            break;
        }
    }
}

#[test]
fn invariants_hold_in_a_busy_match() {
    let mut sim = Simulation::with_tuning(&roster(12), busy_tuning(), 1234).unwrap();
    check_invariants(&mut sim, 1500);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn invariants_hold_for_any_seed(seed in any::<u64>(), players in 2u32..9) {
        let mut sim = Simulation::with_tuning(&roster(players), busy_tuning(), seed).unwrap();
        check_invariants(&mut sim, 400);
    }
}
