//! Target and item selection shared by the movement AI and attack stages.
//!
//! # Tie-break
//!
//! Among enemies within range, [`find_target`] prefers:
//!
//! 1. the lowest current hp,
//! 2. then the nearest (distances within `1e-4` count as equal),
//! 3. then the lowest player id.

use glam::Vec2;

use crate::arena::Arena;
use crate::entity::PlayerId;
use crate::item::ItemId;

/// Distances closer than this are treated as equal when breaking ties.
const DISTANCE_EPSILON: f32 = 1e-4;

/// An enemy picked by [`find_target`] or [`closest_enemy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// Enemy id
    pub id: PlayerId,
    /// Enemy position at selection time
    pub position: Vec2,
    /// Exact distance from the seeker
    pub distance: f32,
}

/// Best enemy within `range` of `seeker`.
///
/// Candidates come from the spatial hash, so the hash must have been rebuilt
/// this stage. Exact distances use live positions.
#[must_use]
pub fn find_target(arena: &Arena, seeker: PlayerId, range: f32) -> Option<Target> {
    let origin = arena.players.get(&seeker)?.position;
    let mut best: Option<(Target, f32)> = None;

    for id in arena.spatial.query_circle(origin, range) {
        if id == seeker {
            continue;
        }
        let Some(candidate) = arena.players.get(&id).filter(|p| p.alive) else {
            continue;
        };

        let distance = candidate.position.distance(origin);
        if distance > range {
            continue;
        }

        let hp = candidate.vitals.hp;
        let take = match &best {
            None => true,
            Some((current, current_hp)) => {
                let less_hp = hp < *current_hp;
                let same_hp = hp == *current_hp;
                let closer = distance < current.distance;
                let same_distance = (distance - current.distance).abs() < DISTANCE_EPSILON;
                less_hp || (same_hp && (closer || (same_distance && id < current.id)))
            }
        };

        if take {
            let target = Target {
                id,
                position: candidate.position,
                distance,
            };
            best = Some((target, hp));
        }
    }

    best.map(|(target, _)| target)
}

/// Nearest alive enemy anywhere on the map; the lowest id wins exact ties.
#[must_use]
pub fn closest_enemy(arena: &Arena, seeker: PlayerId) -> Option<Target> {
    let origin = arena.players.get(&seeker)?.position;
    let mut best: Option<Target> = None;

    for other in arena.players.values() {
        if !other.alive || other.id == seeker {
            continue;
        }
        let distance = other.position.distance(origin);
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Target {
                id: other.id,
                position: other.position,
                distance,
            });
        }
    }

    best
}

/// Nearest item within `range` of `origin`; the lowest id wins exact ties.
#[must_use]
pub fn nearest_item(arena: &Arena, origin: Vec2, range: f32) -> Option<(ItemId, Vec2, f32)> {
    let mut best: Option<(ItemId, Vec2, f32)> = None;

    for item in arena.items.values() {
        let distance = item.position.distance(origin);
        if distance > range {
            continue;
        }
        if best.map_or(true, |(_, _, d)| distance < d) {
            best = Some((item.id, item.position, distance));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::entity::{ClassKind, RosterEntry};
    use crate::item::{Item, ItemKind};

    /// Arena with players at the given positions and hp values.
    fn arena_with(layout: &[(Vec2, f32)]) -> Arena {
        let roster: Vec<_> = (1..=layout.len() as u32)
            .map(|i| RosterEntry::new(format!("c{i}"), i, format!("P{i}"), ClassKind::Paladin))
            .collect();
        let mut arena = Arena::new(&roster, Tuning::default(), 3);
        for (i, (pos, hp)) in layout.iter().enumerate() {
            let player = arena.player_mut(PlayerId::new(i as u32 + 1)).unwrap();
            player.position = *pos;
            player.vitals.hp = *hp;
        }
        arena.rebuild_spatial();
        arena
    }

    mod find_target_tests {
        use super::*;

        #[test]
        fn prefers_lowest_hp_over_distance() {
            let arena = arena_with(&[
                (Vec2::new(100.0, 100.0), 10_000.0),
                (Vec2::new(105.0, 100.0), 9000.0),
                (Vec2::new(140.0, 100.0), 3000.0),
            ]);

            let target = find_target(&arena, PlayerId::new(1), 55.0).unwrap();
            assert_eq!(target.id, PlayerId::new(3));
            assert!((target.distance - 40.0).abs() < 1e-4);
        }

        #[test]
        fn equal_hp_prefers_nearest() {
            let arena = arena_with(&[
                (Vec2::new(100.0, 100.0), 10_000.0),
                (Vec2::new(130.0, 100.0), 5000.0),
                (Vec2::new(110.0, 100.0), 5000.0),
            ]);

            let target = find_target(&arena, PlayerId::new(1), 55.0).unwrap();
            assert_eq!(target.id, PlayerId::new(3));
        }

        #[test]
        fn equal_hp_and_distance_prefers_lowest_id() {
            let arena = arena_with(&[
                (Vec2::new(100.0, 100.0), 10_000.0),
                (Vec2::new(120.0, 100.0), 5000.0),
                (Vec2::new(80.0, 100.0), 5000.0),
            ]);

            let target = find_target(&arena, PlayerId::new(1), 55.0).unwrap();
            assert_eq!(target.id, PlayerId::new(2));
        }

        #[test]
        fn ignores_out_of_range_and_dead() {
            let mut arena = arena_with(&[
                (Vec2::new(100.0, 100.0), 10_000.0),
                (Vec2::new(200.0, 100.0), 100.0),
                (Vec2::new(110.0, 100.0), 100.0),
            ]);
            arena.player_mut(PlayerId::new(3)).unwrap().kill(1);

            assert!(find_target(&arena, PlayerId::new(1), 55.0).is_none());
        }

        #[test]
        fn never_targets_self() {
            let arena = arena_with(&[(Vec2::new(100.0, 100.0), 1.0)]);
            assert!(find_target(&arena, PlayerId::new(1), 55.0).is_none());
        }
    }

    mod closest_tests {
        use super::*;

        #[test]
        fn closest_enemy_ignores_range() {
            let arena = arena_with(&[
                (Vec2::new(10.0, 10.0), 10_000.0),
                (Vec2::new(300.0, 300.0), 10_000.0),
                (Vec2::new(200.0, 10.0), 10_000.0),
            ]);

            let rival = closest_enemy(&arena, PlayerId::new(1)).unwrap();
            assert_eq!(rival.id, PlayerId::new(3));
        }

        #[test]
        fn nearest_item_within_range() {
            let mut arena = arena_with(&[(Vec2::new(100.0, 100.0), 10_000.0)]);
            for (raw, pos) in [(1, Vec2::new(130.0, 100.0)), (2, Vec2::new(90.0, 100.0))] {
                let id = ItemId::new(raw);
                arena.items.insert(
                    id,
                    Item {
                        id,
                        kind: ItemKind::Boots,
                        position: pos,
                        radius: 4.0,
                        expires_at: 100,
                    },
                );
            }

            let (id, _, distance) = nearest_item(&arena, Vec2::new(100.0, 100.0), 40.0).unwrap();
            assert_eq!(id, ItemId::new(2));
            assert_eq!(distance, 10.0);
            assert!(nearest_item(&arena, Vec2::new(100.0, 100.0), 5.0).is_none());
        }
    }
}
