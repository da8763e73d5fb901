//! Hazard scheduling: meteor waves, random fire, the shrinking ring, and
//! meteor impacts.

use emberfall_grid::Square;
use glam::Vec2;
use tracing::{debug, info};

use super::{is_due, Stage};
use crate::arena::Arena;
use crate::hazard::{HazardKind, HazardPhase};

/// Stage 1: spawns a meteor wave and a random fire zone on their periods.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardSpawn;

impl Stage for HazardSpawn {
    fn name(&self) -> &'static str {
        "hazard_spawn"
    }

    fn run(&self, arena: &mut Arena) {
        let tick = arena.tick;
        if is_due(tick, arena.tuning.meteor_interval_ticks) {
            spawn_meteor_wave(arena);
        }
        if is_due(tick, arena.tuning.fire_interval_ticks) {
            spawn_fire_zone(arena);
        }
    }
}

/// One meteor per ten alive players, at least one.
fn spawn_meteor_wave(arena: &mut Arena) {
    let alive = arena.alive_count();
    if alive == 0 {
        return;
    }

    let tick = arena.tick;
    let size = arena.tuning.meteor_area_px;
    let triggers_at = tick.saturating_add(arena.tuning.meteor_warning_ticks);
    let then_until = triggers_at.saturating_add(arena.tuning.meteor_linger_ticks);

    for _ in 0..(alive / 10).max(1) {
        let center = arena.random_square_center(size);
        arena.spawn_hazard(
            HazardKind::Meteor,
            Square::new(center, size),
            HazardPhase::Pending {
                triggers_at,
                then_until: Some(then_until),
            },
        );
    }
    debug!(tick, alive, "meteor wave incoming");
}

fn spawn_fire_zone(arena: &mut Arena) {
    let size = arena.tuning.fire_area_px;
    let center = arena.random_square_center(size);
    let until = arena.tick.saturating_add(arena.tuning.fire_duration_ticks);
    arena.spawn_hazard(
        HazardKind::Fire,
        Square::new(center, size),
        HazardPhase::Active { until: Some(until) },
    );
}

// =============================================================================
// Shrinking ring
// =============================================================================

/// Stage 3: from the start tick on, every step interval, telegraphs the next
/// outer ring of cells as pending fire. Stops for good once the safe area
/// would drop below the configured minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingShrink;

impl Stage for RingShrink {
    fn name(&self) -> &'static str {
        "ring_shrink"
    }

    fn run(&self, arena: &mut Arena) {
        let tick = arena.tick;
        let Some(next) = arena.ring.next_shrink_at else {
            return;
        };
        if tick < next {
            return;
        }

        let layer = arena.ring.layer;
        let cells = i64::from(arena.map.cells_per_side);
        let remaining = cells - (i64::from(layer) + 1) * 2;
        if remaining < i64::from(arena.tuning.shrink_min_safe_cells) {
            arena.ring.next_shrink_at = None;
            info!(tick, layer, "ring reached minimum safe area");
            return;
        }

        let centers = ring_cell_centers(cells, i64::from(layer), arena.tuning.grid_cell_px);
        if centers.is_empty() {
            arena.ring.next_shrink_at = None;
            return;
        }

        let triggers_at = tick.saturating_add(arena.tuning.shrink_warning_ticks);
        let cell = arena.tuning.grid_cell_px;
        for center in &centers {
            arena.spawn_hazard(
                HazardKind::Fire,
                Square::new(*center, cell),
                HazardPhase::Pending {
                    triggers_at,
                    then_until: None,
                },
            );
        }

        arena.ring.layer += 1;
        let step = arena.tuning.shrink_step_ticks;
        arena.ring.next_shrink_at = Some(next.saturating_add(step));
        info!(tick, layer, cells = centers.len(), triggers_at, "ring shrinking");
    }
}

/// World-space centers of the square ring of cells `layer` cells in from the
/// edge: top and bottom rows in full, then the side columns between them.
#[allow(clippy::cast_precision_loss)]
fn ring_cell_centers(cells_per_side: i64, layer: i64, cell_px: f32) -> Vec<Vec2> {
    let min = layer;
    let max = cells_per_side - layer - 1;
    if max - min < 1 {
        return Vec::new();
    }

    let to_world = |cx: i64, cy: i64| {
        Vec2::new(
            cx as f32 * cell_px + cell_px / 2.0,
            cy as f32 * cell_px + cell_px / 2.0,
        )
    };

    let mut centers = Vec::new();
    for x in min..=max {
        centers.push(to_world(x, min));
        centers.push(to_world(x, max));
    }
    for y in (min + 1)..max {
        centers.push(to_world(min, y));
        centers.push(to_world(max, y));
    }
    centers
}

/// Stage 4: ignites ring cells whose warning has elapsed. They burn forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingActivation;

impl Stage for RingActivation {
    fn name(&self) -> &'static str {
        "ring_activation"
    }

    fn run(&self, arena: &mut Arena) {
        let tick = arena.tick;
        for hazard in arena.hazards.values_mut() {
            if hazard.is_due(HazardKind::Fire, tick) {
                hazard.activate();
            }
        }
    }
}

// =============================================================================
// Meteor impact
// =============================================================================

/// Stage 8: every due meteor queues its damage on each alive player inside
/// its square, then turns into a harmless crater.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeteorImpact;

impl Stage for MeteorImpact {
    fn name(&self) -> &'static str {
        "meteor_impact"
    }

    fn run(&self, arena: &mut Arena) {
        let tick = arena.tick;
        let damage = arena.tuning.meteor_damage;
        let mut hits = Vec::new();

        for hazard in arena.hazards.values_mut() {
            if !hazard.is_due(HazardKind::Meteor, tick) {
                continue;
            }
            hits.extend(
                arena
                    .players
                    .values()
                    .filter(|player| player.alive && hazard.area.contains(player.position))
                    .map(|player| player.id),
            );
            hazard.activate();
        }

        for id in hits {
            arena.queue_damage(id, damage);
        }
    }
}
