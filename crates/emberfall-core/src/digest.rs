//! State hashing for determinism checks.
//!
//! Two arenas built from the same roster, tuning and seed and stepped the same
//! number of times must produce the same digest. Floats are hashed by their
//! bit patterns.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec2;

use crate::arena::Arena;
use crate::entity::Player;
use crate::hazard::Hazard;
use crate::item::Item;

/// Deterministic hash of the whole arena: tick, players, hazards, items,
/// ring progress and undelivered pickups.
#[must_use]
pub fn hash_arena(arena: &Arena) -> u64 {
    let mut hasher = DefaultHasher::new();

    arena.tick().hash(&mut hasher);
    arena.seed().hash(&mut hasher);
    arena.map().cells_per_side.hash(&mut hasher);

    for player in arena.players() {
        hash_player(player, &mut hasher);
    }
    for hazard in arena.hazards() {
        hash_hazard(hazard, &mut hasher);
    }
    for item in arena.items() {
        hash_item(item, &mut hasher);
    }

    let ring = arena.ring();
    ring.layer.hash(&mut hasher);
    ring.next_shrink_at.hash(&mut hasher);

    for event in &arena.pickups {
        event.id.hash(&mut hasher);
        event.player_id.hash(&mut hasher);
        event.tick.hash(&mut hasher);
    }

    hasher.finish()
}

fn hash_vec2<H: Hasher>(v: Vec2, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}

fn hash_player<H: Hasher>(player: &Player, hasher: &mut H) {
    player.id.hash(hasher);
    player.class.hash(hasher);
    hash_vec2(player.position, hasher);
    player.vitals.hp.to_bits().hash(hasher);
    player.vitals.max_hp.to_bits().hash(hasher);
    player.vitals.shield.to_bits().hash(hasher);
    player.combat.attack_damage.to_bits().hash(hasher);
    player.combat.cooldown.hash(hasher);
    player.combat.cooldown_max.hash(hasher);
    player.combat.speed_per_tick.to_bits().hash(hasher);
    player.items.hash(hasher);
    hash_vec2(player.wander.dir, hasher);
    player.wander.ticks_left.hash(hasher);
    player.abilities.bits().hash(hasher);
    player.fire_ticks.hash(hasher);
    player.alive.hash(hasher);
    player.death_tick.hash(hasher);
}

fn hash_hazard<H: Hasher>(hazard: &Hazard, hasher: &mut H) {
    hazard.id.hash(hasher);
    hazard.kind.hash(hasher);
    hash_vec2(hazard.area.center, hasher);
    hazard.area.size.to_bits().hash(hasher);
    hazard.phase.hash(hasher);
}

fn hash_item<H: Hasher>(item: &Item, hasher: &mut H) {
    item.id.hash(hasher);
    item.kind.hash(hasher);
    hash_vec2(item.position, hasher);
    item.expires_at.hash(hasher);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PlayerId;
    use crate::tests::helpers::{arena_at, quiet_tuning};

    #[test]
    fn identical_arenas_hash_equal() {
        let a = arena_at(quiet_tuning(), &[Vec2::new(50.0, 50.0), Vec2::new(90.0, 50.0)]);
        let b = arena_at(quiet_tuning(), &[Vec2::new(50.0, 50.0), Vec2::new(90.0, 50.0)]);
        assert_eq!(hash_arena(&a), hash_arena(&b));
    }

    #[test]
    fn any_field_change_alters_hash() {
        let a = arena_at(quiet_tuning(), &[Vec2::new(50.0, 50.0), Vec2::new(90.0, 50.0)]);
        let base = hash_arena(&a);

        let mut moved = a.clone();
        moved.player_mut(PlayerId::new(2)).unwrap().position.x += 0.001;
        assert_ne!(hash_arena(&moved), base);

        let mut hurt = a.clone();
        hurt.player_mut(PlayerId::new(1)).unwrap().vitals.hp -= 1.0;
        assert_ne!(hash_arena(&hurt), base);

        let mut later = a;
        later.advance_tick();
        assert_ne!(hash_arena(&later), base);
    }
}
