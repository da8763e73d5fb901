//! Factories for arenas, rosters and tuning tables used across tests.

use glam::Vec2;

use crate::arena::Arena;
use crate::config::Tuning;
use crate::entity::{ClassKind, RosterEntry};
use crate::item::{Item, ItemId, ItemKind};
use crate::output::Output;
use crate::simulation::Simulation;

// =============================================================================
// Tuning and rosters
// =============================================================================

/// Default tuning with every periodic spawner switched off, so a stage under
/// test is the only thing changing the world.
pub fn quiet_tuning() -> Tuning {
    Tuning {
        meteor_interval_ticks: u64::MAX,
        fire_interval_ticks: u64::MAX,
        item_spawn_interval_ticks: u64::MAX,
        shrink_start_ticks: u64::MAX,
        ..Tuning::default()
    }
}

/// `n` players with ids `1..=n`, connections `c{i}` and classes rotating
/// through [`ClassKind::ALL`] (player 1 is a paladin).
pub fn roster(n: u32) -> Vec<RosterEntry> {
    (1..=n)
        .map(|i| {
            let class = ClassKind::ALL[(i % 3) as usize];
            RosterEntry::new(format!("c{i}"), i, format!("P{i}"), class)
        })
        .collect()
}

// =============================================================================
// Arenas
// =============================================================================

/// Arena of sorceresses placed at `positions` (player `i + 1` at
/// `positions[i]`). The map is sized for the roster as usual.
pub fn arena_at(tuning: Tuning, positions: &[Vec2]) -> Arena {
    let layout: Vec<_> = positions
        .iter()
        .map(|&pos| (ClassKind::Sorceress, pos))
        .collect();
    arena_with_classes(tuning, &layout)
}

/// Arena with one player per `(class, position)` entry, ids from 1.
pub fn arena_with_classes(tuning: Tuning, layout: &[(ClassKind, Vec2)]) -> Arena {
    let roster: Vec<_> = (1..)
        .zip(layout)
        .map(|(i, &(class, _))| RosterEntry::new(format!("c{i}"), i, format!("P{i}"), class))
        .collect();
    let mut arena = Arena::new(&roster, tuning, 1);
    for (entry, &(_, pos)) in roster.iter().zip(layout) {
        if let Some(player) = arena.player_mut(entry.player_id) {
            player.position = pos;
        }
    }
    arena
}

/// Drops an item of `kind` at `position`, expiring at tick 1000.
pub fn place_item(arena: &mut Arena, kind: ItemKind, position: Vec2) -> ItemId {
    let id = arena.next_item_id();
    let radius = arena.tuning.item_radius_px;
    arena.items.insert(
        id,
        Item {
            id,
            kind,
            position,
            radius,
            expires_at: 1000,
        },
    );
    id
}

// =============================================================================
// Running matches
// =============================================================================

/// Steps `sim` until it ends or `max_ticks` pass, returning every output.
pub fn run_to_end(sim: &mut Simulation, max_ticks: u64) -> Vec<Output> {
    let mut outputs = Vec::new();
    while !sim.is_ended() && sim.tick() < max_ticks {
        outputs.extend(sim.step());
    }
    outputs
}
