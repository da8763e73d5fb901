//! Damage resolution: shields, class abilities, deaths and the low-hp escape.

use std::f32::consts::FRAC_PI_4;

use glam::Vec2;
use tracing::{debug, info};

use super::Stage;
use crate::arena::Arena;
use crate::entity::{AbilityFlags, ClassKind, PlayerId};
use crate::targeting::closest_enemy;

/// Stage 12: applies every queued total in ascending player id order, then
/// empties the queue.
///
/// Per player:
///
/// 1. A barbarian's first damage grants the one-shot shield.
/// 2. The shield absorbs what it can; the rest comes off hp.
/// 3. A paladin crossing down through the trigger hp is healed once.
/// 4. Hp at or below zero kills the player.
/// 5. A survivor crossing down through the low-hp ratio teleports away from
///    the nearest enemy once and has its attack locked for a while.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageResolution;

impl Stage for DamageResolution {
    fn name(&self) -> &'static str {
        "damage_resolution"
    }

    fn run(&self, arena: &mut Arena) {
        let queued = std::mem::take(&mut arena.damage);
        let tick = arena.tick;
        let shield = arena.tuning.barbarian_shield;
        let trigger = arena.tuning.paladin_trigger_hp;
        let heal_to = arena.tuning.paladin_heal_to_hp;
        let ratio = arena.tuning.low_hp_trigger_ratio;
        let lock = arena.tuning.low_hp_attack_lock_ticks;

        for (id, total) in queued {
            if total <= 0.0 {
                continue;
            }
            let Some(player) = arena.players.get_mut(&id).filter(|p| p.alive) else {
                continue;
            };

            if player.class == ClassKind::Barbarian
                && player.abilities.claim(AbilityFlags::SHIELD_USED)
            {
                player.vitals.shield += shield;
                debug!(tick, player = %id, shield, "barbarian shield granted");
            }

            let before = player.vitals.hp;
            let rest = player.vitals.absorb(total);
            player.vitals.hp -= rest;

            if player.class == ClassKind::Paladin
                && before > trigger
                && player.vitals.hp <= trigger
                && player.abilities.claim(AbilityFlags::HEAL_USED)
            {
                player.vitals.hp = heal_to.min(player.vitals.max_hp);
                debug!(tick, player = %id, hp = player.vitals.hp, "paladin heal");
            }

            if player.vitals.hp <= 0.0 {
                player.kill(tick);
                info!(tick, player = %id, name = %player.name, "player died");
                continue;
            }

            let threshold = player.vitals.max_hp * ratio;
            if before > threshold
                && player.vitals.hp <= threshold
                && player.abilities.claim(AbilityFlags::ESCAPE_USED)
            {
                low_hp_teleport(arena, id);
                if let Some(player) = arena.players.get_mut(&id) {
                    player.combat.cooldown = player.combat.cooldown.max(lock);
                }
            }
        }
    }
}

/// Moves `id` a random distance away from its nearest enemy, roughly along
/// the line from that enemy. Does nothing unless that enemy is within
/// detection range. When no spot near the enemy is valid, falls back to a
/// random valid spot, and leaves the player in place if that fails too.
fn low_hp_teleport(arena: &mut Arena, id: PlayerId) {
    let Some(rival) = closest_enemy(arena, id) else {
        debug!(tick = arena.tick, player = %id, "low-hp escape with no enemy");
        return;
    };
    if rival.distance > arena.tuning.detection_range_px {
        debug!(
            tick = arena.tick,
            player = %id,
            rival = %rival.id,
            "low-hp escape, enemy out of range"
        );
        return;
    }
    let Some(pos) = arena.players.get(&id).map(|p| p.position) else {
        return;
    };

    let attempts = arena.tuning.low_hp_teleport_attempts;
    let away = arena.normalize_or_random(pos - rival.position);
    let min = arena.tuning.low_hp_teleport_min_px;
    let max = arena.tuning.low_hp_teleport_max_px;

    for _ in 0..attempts {
        let jitter = arena.random_range(-FRAC_PI_4, FRAC_PI_4);
        let dir = Vec2::from_angle(jitter).rotate(away);
        let distance = arena.random_range(min, max);
        let candidate = rival.position + dir * distance;
        if arena.is_valid_teleport(candidate, id) {
            if let Some(player) = arena.players.get_mut(&id) {
                player.position = candidate;
            }
            debug!(tick = arena.tick, player = %id, rival = %rival.id, "low-hp escape");
            return;
        }
    }

    if arena.try_random_teleport(id, attempts) {
        debug!(tick = arena.tick, player = %id, "low-hp escape to random spot");
    } else {
        debug!(tick = arena.tick, player = %id, "low-hp escape found no spot");
    }
}
