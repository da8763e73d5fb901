//! Item economy: batch spawning and pickup.

use tracing::debug;

use super::{is_due, Stage};
use crate::arena::Arena;
use crate::item::{Item, ItemKind};
use crate::output::PickupEvent;

/// Stage 2: on its period, spawns `max(1, alive / 3)` items, limited by the
/// free slots under the map ceiling. Placement avoids active fire when a
/// bounded number of tries allows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemSpawn;

impl Stage for ItemSpawn {
    fn name(&self) -> &'static str {
        "item_spawn"
    }

    fn run(&self, arena: &mut Arena) {
        let tick = arena.tick;
        if !is_due(tick, arena.tuning.item_spawn_interval_ticks) {
            return;
        }

        let alive = arena.alive_count();
        if alive == 0 {
            return;
        }

        let free = arena.tuning.max_items.saturating_sub(arena.items.len());
        let count = free.min((alive / 3).max(1));
        let radius = arena.tuning.item_radius_px;
        let attempts = arena.tuning.item_spawn_attempts;
        let expires_at = tick.saturating_add(arena.tuning.item_ttl_ticks);

        for _ in 0..count {
            let position = arena.random_point_avoiding_fire(radius, attempts);
            let kind = ItemKind::roll(&mut arena.rng);
            let id = arena.next_item_id();
            arena.items.insert(
                id,
                Item {
                    id,
                    kind,
                    position,
                    radius,
                    expires_at,
                },
            );
        }

        if count > 0 {
            debug!(tick, count, "items spawned");
        }
    }
}

/// Stage 9: each item goes to the first alive player (by id) whose body
/// touches it. The effect applies at once and a pickup event is recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCollection;

impl Stage for ItemCollection {
    fn name(&self) -> &'static str {
        "item_collection"
    }

    fn run(&self, arena: &mut Arena) {
        if arena.items.is_empty() {
            return;
        }

        let tick = arena.tick;
        let body = arena.tuning.player_radius_px;
        let item_ids: Vec<_> = arena.items.keys().copied().collect();

        for item_id in item_ids {
            let Some(item) = arena.items.get(&item_id) else {
                continue;
            };
            let Some(picker) = arena
                .players
                .values()
                .find(|player| player.alive && item.touches(player.position, body))
                .map(|player| player.id)
            else {
                continue;
            };

            let kind = item.kind;
            arena.items.remove(&item_id);
            let event_id = arena.next_pickup_id();

            let tuning = &arena.tuning;
            let Some(player) = arena.players.get_mut(&picker) else {
                continue;
            };
            kind.apply(player, tuning);

            arena.pickups.push(PickupEvent {
                id: event_id,
                connection_id: player.connection_id.clone(),
                player_id: player.id,
                player_name: player.name.clone(),
                item_kind: kind,
                tick,
            });
        }
    }
}
