//! Melee attacks and fire exposure.

use tracing::debug;

use super::Stage;
use crate::arena::Arena;
use crate::entity::ClassKind;
use crate::targeting::find_target;

/// Stage 10: ticks attack cooldowns down and lets every ready player hit the
/// best target within attack range.
///
/// A hit queues the attacker's current damage on the target, knocks the
/// target back along the attacker-to-target line, and resets the cooldown.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackSchedule;

impl Stage for AttackSchedule {
    fn name(&self) -> &'static str {
        "attack_schedule"
    }

    fn run(&self, arena: &mut Arena) {
        arena.rebuild_spatial();
        let range = arena.tuning.attack_range_px;
        let knockback = arena.tuning.knockback_px;

        for id in arena.alive_ids() {
            let Some(attacker) = arena.players.get_mut(&id) else {
                continue;
            };
            attacker.combat.cooldown = attacker.combat.cooldown.saturating_sub(1);
            if attacker.combat.cooldown > 0 {
                continue;
            }
            let origin = attacker.position;
            let damage = attacker.combat.attack_damage;

            let Some(target) = find_target(arena, id, range) else {
                continue;
            };

            arena.queue_damage(target.id, damage);
            let dir = arena.normalize_or_random(target.position - origin);
            let pushed = arena.clamp_to_map(target.position + dir * knockback);
            if let Some(victim) = arena.players.get_mut(&target.id) {
                victim.position = pushed;
            }
            if let Some(attacker) = arena.players.get_mut(&id) {
                attacker.combat.cooldown = attacker.combat.cooldown_max;
            }
        }
    }
}

/// Stage 11: queues fire damage for every active fire covering each alive
/// player (blessed players are immune) and runs the sorceress fire escape.
///
/// A sorceress counts consecutive ticks spent in fire. On reaching the
/// threshold she teleports to a random valid spot, or the map center if none
/// is found, and the count restarts. Leaving fire resets the count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FireExposure;

impl Stage for FireExposure {
    fn name(&self) -> &'static str {
        "fire_exposure"
    }

    fn run(&self, arena: &mut Arena) {
        let per_tick = arena.tuning.fire_damage_per_tick();
        let threshold = arena.tuning.sorceress_fire_teleport_ticks;
        let attempts = arena.tuning.sorceress_teleport_attempts;

        for id in arena.alive_ids() {
            let Some(player) = arena.players.get(&id) else {
                continue;
            };
            let pos = player.position;
            let immune = player.items.blessings > 0;
            let class = player.class;

            let zones = arena
                .hazards
                .values()
                .filter(|hazard| hazard.burns(pos))
                .count();
            if !immune {
                for _ in 0..zones {
                    arena.queue_damage(id, per_tick);
                }
            }

            if class != ClassKind::Sorceress {
                continue;
            }

            let Some(player) = arena.players.get_mut(&id) else {
                continue;
            };
            if zones == 0 {
                player.fire_ticks = 0;
                continue;
            }

            player.fire_ticks += 1;
            if player.fire_ticks < threshold {
                continue;
            }
            player.fire_ticks = 0;

            if arena.try_random_teleport(id, attempts) {
                debug!(tick = arena.tick, player = %id, "sorceress fire escape");
            } else {
                let center = arena.clamp_to_map(arena.center());
                if let Some(player) = arena.players.get_mut(&id) {
                    player.position = center;
                }
                debug!(tick = arena.tick, player = %id, "sorceress fire escape fell back to center");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::entity::PlayerId;
    use crate::hazard::{HazardKind, HazardPhase};
    use crate::tests::helpers::{arena_at, arena_with_classes, quiet_tuning};
    use emberfall_grid::Square;
    use glam::Vec2;

    fn ignite(arena: &mut Arena, center: Vec2, size: f32) {
        arena.spawn_hazard(
            HazardKind::Fire,
            Square::new(center, size),
            HazardPhase::Active { until: None },
        );
    }

    mod attack_tests {
        use super::*;

        #[test]
        fn ready_attacker_hits_and_knocks_back() {
            let mut arena = arena_at(quiet_tuning(), &[Vec2::new(100.0, 100.0), Vec2::new(110.0, 100.0)]);
            // Only player 1 is ready.
            arena.player_mut(PlayerId::new(2)).unwrap().combat.cooldown = 5;

            AttackSchedule.run(&mut arena);

            assert_eq!(arena.queued_damage(PlayerId::new(2)), 500.0);
            assert_eq!(arena.queued_damage(PlayerId::new(1)), 0.0);
            let victim = arena.player(PlayerId::new(2)).unwrap();
            assert!((victim.position.x - 115.0).abs() < 1e-4);
            assert_eq!(arena.player(PlayerId::new(1)).unwrap().combat.cooldown, 30);
            assert_eq!(victim.combat.cooldown, 4);
        }

        #[test]
        fn out_of_range_keeps_cooldown_at_zero() {
            let mut arena = arena_at(quiet_tuning(), &[Vec2::new(100.0, 100.0), Vec2::new(112.0, 100.0)]);

            AttackSchedule.run(&mut arena);

            assert_eq!(arena.queued_damage(PlayerId::new(2)), 0.0);
            assert_eq!(arena.player(PlayerId::new(1)).unwrap().combat.cooldown, 0);
        }

        #[test]
        fn knockback_is_clamped_to_map() {
            let mut arena = arena_at(quiet_tuning(), &[Vec2::new(18.0, 100.0), Vec2::new(9.0, 100.0)]);
            arena.player_mut(PlayerId::new(2)).unwrap().combat.cooldown = 5;

            AttackSchedule.run(&mut arena);

            assert_eq!(arena.player(PlayerId::new(2)).unwrap().position.x, 8.0);
        }

        #[test]
        fn uses_current_attack_damage_and_cooldown_max() {
            let mut arena = arena_at(quiet_tuning(), &[Vec2::new(100.0, 100.0), Vec2::new(105.0, 100.0)]);
            {
                let attacker = arena.player_mut(PlayerId::new(1)).unwrap();
                attacker.combat.attack_damage = 700.0;
                attacker.combat.cooldown_max = 14;
            }
            arena.player_mut(PlayerId::new(2)).unwrap().combat.cooldown = 5;

            AttackSchedule.run(&mut arena);

            assert_eq!(arena.queued_damage(PlayerId::new(2)), 700.0);
            assert_eq!(arena.player(PlayerId::new(1)).unwrap().combat.cooldown, 14);
        }
    }

    mod fire_tests {
        use super::*;

        #[test]
        fn overlapping_fires_stack() {
            let mut arena = arena_at(quiet_tuning(), &[Vec2::new(100.0, 100.0), Vec2::new(250.0, 250.0)]);
            ignite(&mut arena, Vec2::new(100.0, 100.0), 40.0);
            ignite(&mut arena, Vec2::new(110.0, 100.0), 40.0);

            FireExposure.run(&mut arena);

            assert_eq!(arena.queued_damage(PlayerId::new(1)), 50.0);
            assert_eq!(arena.queued_damage(PlayerId::new(2)), 0.0);
        }

        #[test]
        fn blessing_grants_immunity() {
            let mut arena = arena_at(quiet_tuning(), &[Vec2::new(100.0, 100.0)]);
            arena.player_mut(PlayerId::new(1)).unwrap().items.blessings = 1;
            ignite(&mut arena, Vec2::new(100.0, 100.0), 40.0);

            FireExposure.run(&mut arena);

            assert_eq!(arena.queued_damage(PlayerId::new(1)), 0.0);
        }

        #[test]
        fn sorceress_teleports_after_threshold() {
            let tuning = Tuning {
                sorceress_fire_teleport_ticks: 3,
                ..quiet_tuning()
            };
            let mut arena = arena_with_classes(tuning, &[(ClassKind::Sorceress, Vec2::new(100.0, 100.0))]);
            ignite(&mut arena, Vec2::new(100.0, 100.0), 40.0);

            FireExposure.run(&mut arena);
            FireExposure.run(&mut arena);
            let player = arena.player(PlayerId::new(1)).unwrap();
            assert_eq!(player.fire_ticks, 2);
            assert_eq!(player.position, Vec2::new(100.0, 100.0));

            FireExposure.run(&mut arena);
            let player = arena.player(PlayerId::new(1)).unwrap();
            assert_eq!(player.fire_ticks, 0);
            assert!(!arena.is_in_fire(player.position));
            assert!(arena.in_bounds(player.position));
        }

        #[test]
        fn leaving_fire_resets_count() {
            let mut arena = arena_with_classes(quiet_tuning(), &[(ClassKind::Sorceress, Vec2::new(100.0, 100.0))]);
            ignite(&mut arena, Vec2::new(100.0, 100.0), 40.0);

            FireExposure.run(&mut arena);
            assert_eq!(arena.player(PlayerId::new(1)).unwrap().fire_ticks, 1);

            arena.player_mut(PlayerId::new(1)).unwrap().position = Vec2::new(200.0, 200.0);
            FireExposure.run(&mut arena);
            assert_eq!(arena.player(PlayerId::new(1)).unwrap().fire_ticks, 0);
        }

        #[test]
        fn other_classes_do_not_count() {
            let mut arena = arena_with_classes(quiet_tuning(), &[(ClassKind::Barbarian, Vec2::new(100.0, 100.0))]);
            ignite(&mut arena, Vec2::new(100.0, 100.0), 40.0);

            FireExposure.run(&mut arena);

            assert_eq!(arena.player(PlayerId::new(1)).unwrap().fire_ticks, 0);
        }

        #[test]
        fn sorceress_falls_back_to_center() {
            let tuning = Tuning {
                sorceress_fire_teleport_ticks: 1,
                ..quiet_tuning()
            };
            let mut arena = arena_with_classes(tuning, &[(ClassKind::Sorceress, Vec2::new(100.0, 100.0))]);
            // Fire over the whole map: no valid teleport target exists.
            let center = arena.center();
            let size = arena.map().size_px;
            ignite(&mut arena, center, size);

            FireExposure.run(&mut arena);

            assert_eq!(arena.player(PlayerId::new(1)).unwrap().position, center);
        }
    }
}
