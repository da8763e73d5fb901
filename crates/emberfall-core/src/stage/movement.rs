//! Movement AI, player separation and the danger nudge.
//!
//! Players are processed one at a time in id order against live positions,
//! so a player moved earlier in the loop is seen at its new spot by later
//! players.

use std::collections::BTreeSet;

use glam::Vec2;

use super::Stage;
use crate::arena::Arena;
use crate::entity::PlayerId;
use crate::targeting::{find_target, nearest_item};

/// Weight of one fire zone's repulsion in the escape vector.
const FIRE_REPEL_WEIGHT: f32 = 1.8;
/// Pull toward the map center per pixel of offset, applied while escaping.
const CENTER_PULL: f32 = 0.02;
/// Jitter applied to an exactly-zero axis offset from a fire center.
const FIRE_AXIS_JITTER: f32 = 0.2;
/// Separation distances below this are treated as coincident.
const COINCIDENT_EPSILON: f32 = 1e-4;
/// Smallest danger nudge.
const MIN_NUDGE_PX: f32 = 0.75;
/// Danger nudge as a fraction of the player's per-tick speed.
const NUDGE_SPEED_RATIO: f32 = 0.6;

/// Unit direction away from nearby danger, or `None` when `pos` is clear.
///
/// Danger means being within the wall escape margin of the clamped bound, or
/// inside an active fire grown by the fire escape margin. Wall pushes scale
/// with how deep into the margin the player is; each fire pushes away from
/// its center. While escaping, a small pull toward the map center is added.
pub(crate) fn escape_direction(arena: &mut Arena, pos: Vec2) -> Option<Vec2> {
    let tuning = &arena.tuning;
    let radius = tuning.player_radius_px;
    let margin = tuning.wall_escape_margin_px;
    let fire_margin = tuning.fire_escape_margin_px;
    let min = arena.min_bound(radius);
    let max = arena.max_bound(radius);

    let mut escaping = false;
    let mut v = Vec2::ZERO;

    for (dist, push) in [
        (pos.x - min, Vec2::X),
        (max - pos.x, Vec2::NEG_X),
        (pos.y - min, Vec2::Y),
        (max - pos.y, Vec2::NEG_Y),
    ] {
        if dist < margin {
            escaping = true;
            v += push * ((margin - dist) / margin);
        }
    }

    let offsets: Vec<Vec2> = arena
        .hazards
        .values()
        .filter(|hazard| hazard.is_burning() && hazard.area.contains_with_margin(pos, fire_margin))
        .map(|hazard| pos - hazard.area.center)
        .collect();

    for offset in offsets {
        escaping = true;
        let jittered = Vec2::new(
            if offset.x == 0.0 {
                arena.random_range(-FIRE_AXIS_JITTER, FIRE_AXIS_JITTER)
            } else {
                offset.x
            },
            if offset.y == 0.0 {
                arena.random_range(-FIRE_AXIS_JITTER, FIRE_AXIS_JITTER)
            } else {
                offset.y
            },
        );
        v += arena.normalize_or_random(jittered) * FIRE_REPEL_WEIGHT;
    }

    if !escaping {
        return None;
    }

    v += (arena.center() - pos) * CENTER_PULL;
    Some(arena.normalize_or_random(v))
}

// =============================================================================
// Movement
// =============================================================================

/// Stage 5: moves every alive player one step.
///
/// Priority: escape danger (at a speed bonus), else walk to an item that is
/// in item range and no farther than the best target, else chase the best
/// target in detection range, else wander.
#[derive(Debug, Clone, Copy, Default)]
pub struct Movement;

impl Stage for Movement {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn run(&self, arena: &mut Arena) {
        arena.rebuild_spatial();
        let detection = arena.tuning.detection_range_px;
        let item_range = arena.tuning.item_detection_range_px;
        let escape_multiplier = arena.tuning.danger_escape_speed_multiplier;
        let wander_ticks = arena.tuning.wander_change_ticks;

        for id in arena.alive_ids() {
            let Some(player) = arena.players.get(&id) else {
                continue;
            };
            let pos = player.position;
            let mut speed = player.combat.speed_per_tick;

            let escape = escape_direction(arena, pos);
            let target = find_target(arena, id, detection);
            let item = nearest_item(arena, pos, item_range);
            let target_distance = target.map_or(f32::INFINITY, |t| t.distance);

            let dir = if let Some(dir) = escape {
                speed *= escape_multiplier;
                dir
            } else if let Some((_, item_pos, _)) =
                item.filter(|(_, _, distance)| *distance <= target_distance)
            {
                arena.normalize_or_random(item_pos - pos)
            } else if let Some(target) = target {
                arena.normalize_or_random(target.position - pos)
            } else {
                wander(arena, id, wander_ticks)
            };

            let next = arena.clamp_to_map(pos + dir * speed);
            if let Some(player) = arena.players.get_mut(&id) {
                player.position = next;
            }
        }
    }
}

/// Current wander heading, refreshed once it has been used for
/// `wander_ticks` ticks.
fn wander(arena: &mut Arena, id: PlayerId, wander_ticks: u32) -> Vec2 {
    let needs_new = arena
        .players
        .get(&id)
        .is_some_and(|player| player.wander.ticks_left == 0);
    let fresh = needs_new.then(|| arena.random_unit());

    let Some(player) = arena.players.get_mut(&id) else {
        return Vec2::ZERO;
    };
    if let Some(dir) = fresh {
        player.wander.dir = dir;
        player.wander.ticks_left = wander_ticks;
    }
    player.wander.ticks_left = player.wander.ticks_left.saturating_sub(1);
    player.wander.dir
}

// =============================================================================
// Separation
// =============================================================================

/// Stage 6: pushes apart any two alive players closer than one body diameter
/// plus the visible gap. Each unordered pair is handled at most once per tick
/// and the correction is split evenly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Separation;

impl Stage for Separation {
    fn name(&self) -> &'static str {
        "separation"
    }

    fn run(&self, arena: &mut Arena) {
        arena.rebuild_spatial();
        let target_gap = arena.tuning.player_diameter() + arena.tuning.separation_gap_px;
        let multiplier = arena.tuning.separation_push_multiplier;
        let min_push = arena.tuning.separation_min_push_px;
        let mut processed: BTreeSet<(PlayerId, PlayerId)> = BTreeSet::new();

        for id in arena.alive_ids() {
            let Some(origin) = arena.players.get(&id).map(|p| p.position) else {
                continue;
            };

            for other_id in arena.spatial.query_circle(origin, target_gap + 2.0) {
                if other_id == id {
                    continue;
                }
                let pair = (id.min(other_id), id.max(other_id));
                let (Some(a), Some(b)) = (arena.players.get(&id), arena.players.get(&other_id))
                else {
                    continue;
                };
                if !b.alive || !processed.insert(pair) {
                    continue;
                }

                let mut delta = b.position - a.position;
                let mut distance = delta.length();
                if distance >= target_gap {
                    continue;
                }
                if distance < COINCIDENT_EPSILON {
                    delta = arena.random_unit();
                    distance = 1.0;
                }

                let normal = delta / distance;
                let push = ((target_gap - distance) / 2.0 * multiplier).max(min_push);
                shove(arena, id, -normal * push);
                shove(arena, other_id, normal * push);
            }
        }
    }
}

/// Moves a player by `offset` and clamps it back into the map.
fn shove(arena: &mut Arena, id: PlayerId, offset: Vec2) {
    let Some(pos) = arena.players.get(&id).map(|p| p.position) else {
        return;
    };
    let next = arena.clamp_to_map(pos + offset);
    if let Some(player) = arena.players.get_mut(&id) {
        player.position = next;
    }
}

// =============================================================================
// Danger nudge
// =============================================================================

/// Stage 7: players still in danger after moving get a small extra push
/// along the escape direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DangerNudge;

impl Stage for DangerNudge {
    fn name(&self) -> &'static str {
        "danger_nudge"
    }

    fn run(&self, arena: &mut Arena) {
        for id in arena.alive_ids() {
            let Some((pos, speed)) = arena
                .players
                .get(&id)
                .map(|p| (p.position, p.combat.speed_per_tick))
            else {
                continue;
            };
            let Some(dir) = escape_direction(arena, pos) else {
                continue;
            };
            let nudge = (speed * NUDGE_SPEED_RATIO).max(MIN_NUDGE_PX);
            shove(arena, id, dir * nudge);
        }
    }
}
