//! Arena: the single owner of all mutable match state.
//!
//! The arena holds players, hazards, items, the per-tick damage queue and the
//! match RNG, plus the geometry helpers every stage shares (bounds, clamping,
//! random placement, fire checks).
//!
//! # Determinism
//!
//! Players, hazards, items and queued damage all live in `BTreeMap`s, so every
//! loop runs in ascending id order. All randomness comes from one
//! `ChaCha8Rng` seeded at construction.
//!
//! # Spatial Index
//!
//! The spatial hash is NOT kept in sync with positions. Stages that query it
//! call [`Arena::rebuild_spatial`] first, and re-check exact distances against
//! live positions afterwards.
//!
//! # Example
//!
//! ```
//! use emberfall_core::arena::Arena;
//! use emberfall_core::config::Tuning;
//! use emberfall_core::entity::{ClassKind, RosterEntry};
//!
//! let roster = vec![
//!     RosterEntry::new("a", 1, "Ash", ClassKind::Barbarian),
//!     RosterEntry::new("b", 2, "Bryn", ClassKind::Paladin),
//! ];
//! let arena = Arena::new(&roster, Tuning::default(), 7);
//!
//! assert_eq!(arena.alive_count(), 2);
//! assert_eq!(arena.map().cells_per_side, 21);
//! for player in arena.players() {
//!     assert!(arena.in_bounds(player.position));
//! }
//! ```

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use emberfall_grid::{SpatialHash, Square};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::config::Tuning;
use crate::entity::{ConnectionId, Player, PlayerId, RosterEntry};
use crate::hazard::{Hazard, HazardId, HazardKind, HazardPhase};
use crate::item::{Item, ItemId};
use crate::output::{MapInfo, PickupEvent};

/// Vectors shorter than this have no usable direction.
const MIN_DIRECTION_LEN: f32 = 1e-5;

// =============================================================================
// Ring state
// =============================================================================

/// Progress of the shrinking safe zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingState {
    /// Layers already scheduled.
    pub layer: u32,
    /// Tick of the next shrink, `None` once shrinking has stopped for good.
    pub next_shrink_at: Option<u64>,
}

// =============================================================================
// Arena
// =============================================================================

/// All mutable state of one match.
#[derive(Debug, Clone)]
pub struct Arena {
    pub(crate) tuning: Tuning,
    pub(crate) map: MapInfo,
    pub(crate) tick: u64,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) connections: BTreeMap<ConnectionId, PlayerId>,
    pub(crate) hazards: BTreeMap<HazardId, Hazard>,
    pub(crate) items: BTreeMap<ItemId, Item>,
    pub(crate) damage: BTreeMap<PlayerId, f32>,
    pub(crate) pickups: Vec<PickupEvent>,
    pub(crate) ring: RingState,
    pub(crate) spatial: SpatialHash<PlayerId>,
    pub(crate) rng: ChaCha8Rng,
    seed: u64,
    next_hazard_id: u64,
    next_item_id: u64,
    next_pickup_id: u64,
}

impl Arena {
    /// Builds the world for `roster`: sizes the map from the roster length
    /// and places every player at a random spot inside the walls.
    ///
    /// The tuning is trusted as-is; validate it first if it came from
    /// outside.
    #[must_use]
    pub fn new(roster: &[RosterEntry], tuning: Tuning, seed: u64) -> Self {
        let map = tuning.map_for(roster.len());
        let mut arena = Self {
            map,
            tick: 0,
            players: BTreeMap::new(),
            connections: BTreeMap::new(),
            hazards: BTreeMap::new(),
            items: BTreeMap::new(),
            damage: BTreeMap::new(),
            pickups: Vec::new(),
            ring: RingState {
                layer: 0,
                next_shrink_at: Some(tuning.shrink_start_ticks),
            },
            spatial: SpatialHash::new(tuning.spatial_cell_px),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            next_hazard_id: 1,
            next_item_id: 1,
            next_pickup_id: 1,
            tuning,
        };

        let radius = arena.tuning.player_radius_px;
        for entry in roster {
            let position = arena.random_point_inside(radius);
            let wander_dir = arena.random_unit();
            let player = Player::spawn(entry, position, wander_dir, &arena.tuning);
            let previous = arena
                .connections
                .insert(entry.connection_id.clone(), entry.player_id);
            if let Some(previous) = previous {
                warn!(connection = %entry.connection_id, %previous, "duplicate connection id in roster");
            }
            arena.players.insert(entry.player_id, player);
        }

        arena
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// Current tick. Zero before the first step.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed the RNG was built from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Map dimensions.
    #[must_use]
    pub const fn map(&self) -> MapInfo {
        self.map
    }

    /// Gameplay constants.
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Shrinking-ring progress.
    #[must_use]
    pub const fn ring(&self) -> RingState {
        self.ring
    }

    /// Every player still in the roster, alive or dead, in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Looks up a player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Looks up a player by id for mutation.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Resolves a connection key to a player id.
    #[must_use]
    pub fn player_id_of(&self, connection: &ConnectionId) -> Option<PlayerId> {
        self.connections.get(connection).copied()
    }

    /// Hazards in id order.
    pub fn hazards(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.values()
    }

    /// Items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Damage queued this tick and not yet resolved.
    #[must_use]
    pub fn queued_damage(&self, id: PlayerId) -> f32 {
        self.damage.get(&id).copied().unwrap_or(0.0)
    }

    /// Ids of alive players in ascending order.
    #[must_use]
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|player| player.alive)
            .map(|player| player.id)
            .collect()
    }

    /// Number of alive players.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|player| player.alive).count()
    }

    // -------------------------------------------------------------------------
    // Roster and bookkeeping
    // -------------------------------------------------------------------------

    /// Drops a player entirely, along with any damage queued for them.
    /// Returns the removed record.
    pub fn remove_player(&mut self, connection: &ConnectionId) -> Option<Player> {
        let id = self.connections.remove(connection)?;
        self.damage.remove(&id);
        self.players.remove(&id)
    }

    /// Adds `amount` to the damage `target` takes at resolution.
    pub fn queue_damage(&mut self, target: PlayerId, amount: f32) {
        *self.damage.entry(target).or_insert(0.0) += amount;
    }

    /// Inserts a hazard with a fresh id.
    pub fn spawn_hazard(&mut self, kind: HazardKind, area: Square, phase: HazardPhase) -> HazardId {
        let id = HazardId::new(self.next_hazard_id);
        self.next_hazard_id += 1;
        self.hazards.insert(
            id,
            Hazard {
                id,
                kind,
                area,
                phase,
            },
        );
        id
    }

    /// Reserves the next item id.
    pub(crate) fn next_item_id(&mut self) -> ItemId {
        let id = ItemId::new(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    /// Reserves the next pickup event id.
    pub(crate) fn next_pickup_id(&mut self) -> u64 {
        let id = self.next_pickup_id;
        self.next_pickup_id += 1;
        id
    }

    /// Clears the spatial hash and re-inserts every alive player.
    pub fn rebuild_spatial(&mut self) {
        self.spatial.clear();
        for player in self.players.values().filter(|player| player.alive) {
            self.spatial.insert(player.id, player.position);
        }
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// Lowest coordinate a body of `radius` may occupy on either axis.
    #[must_use]
    pub fn min_bound(&self, radius: f32) -> f32 {
        radius + self.tuning.wall_padding_px
    }

    /// Highest coordinate a body of `radius` may occupy on either axis.
    #[must_use]
    pub fn max_bound(&self, radius: f32) -> f32 {
        self.map.size_px - radius - self.tuning.wall_padding_px
    }

    /// Map center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::splat(self.map.size_px / 2.0)
    }

    /// Clamps a player position into `[radius + padding, size - radius - padding]`.
    ///
    /// On a map too small for that band the upper bound wins.
    #[must_use]
    pub fn clamp_to_map(&self, pos: Vec2) -> Vec2 {
        let min = self.min_bound(self.tuning.player_radius_px);
        let max = self.max_bound(self.tuning.player_radius_px);
        Vec2::new(pos.x.max(min).min(max), pos.y.max(min).min(max))
    }

    /// Returns true if a player body at `pos` is inside the walls.
    #[must_use]
    pub fn in_bounds(&self, pos: Vec2) -> bool {
        let min = self.min_bound(self.tuning.player_radius_px);
        let max = self.max_bound(self.tuning.player_radius_px);
        pos.x >= min && pos.y >= min && pos.x <= max && pos.y <= max
    }

    /// Returns true if any active fire covers `pos`.
    #[must_use]
    pub fn is_in_fire(&self, pos: Vec2) -> bool {
        self.hazards.values().any(|hazard| hazard.burns(pos))
    }

    /// A teleport target is valid inside the walls, outside active fire, and
    /// at least one body diameter from every other alive player.
    #[must_use]
    pub fn is_valid_teleport(&self, pos: Vec2, ignore: PlayerId) -> bool {
        if !self.in_bounds(pos) || self.is_in_fire(pos) {
            return false;
        }

        let diameter = self.tuning.player_diameter();
        self.players
            .values()
            .filter(|other| other.alive && other.id != ignore)
            .all(|other| other.position.distance(pos) >= diameter)
    }

    // -------------------------------------------------------------------------
    // Randomness
    // -------------------------------------------------------------------------

    /// Uniform value between `min` and `max`. Never panics on an empty or
    /// inverted range.
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.rng.gen::<f32>() * (max - min)
    }

    /// Uniformly random unit vector.
    pub fn random_unit(&mut self) -> Vec2 {
        Vec2::from_angle(self.rng.gen::<f32>() * TAU)
    }

    /// Normalizes `v`, substituting a random unit vector when `v` is too short
    /// to have a direction.
    pub fn normalize_or_random(&mut self, v: Vec2) -> Vec2 {
        let len = v.length();
        if len < MIN_DIRECTION_LEN {
            self.random_unit()
        } else {
            v / len
        }
    }

    /// Random point whose body of `radius` fits inside the walls.
    pub fn random_point_inside(&mut self, radius: f32) -> Vec2 {
        let min = self.min_bound(radius);
        let max = self.max_bound(radius);
        let x = self.random_range(min, max);
        let y = self.random_range(min, max);
        Vec2::new(x, y)
    }

    /// Random point outside active fire, giving up after `attempts` tries and
    /// returning an unchecked random point.
    pub fn random_point_avoiding_fire(&mut self, radius: f32, attempts: u32) -> Vec2 {
        for _ in 0..attempts {
            let candidate = self.random_point_inside(radius);
            if !self.is_in_fire(candidate) {
                return candidate;
            }
        }
        self.random_point_inside(radius)
    }

    /// Random center for a square of side `size` lying fully inside the walls,
    /// or the map center when the square cannot fit.
    pub fn random_square_center(&mut self, size: f32) -> Vec2 {
        let half = size / 2.0;
        let min = self.min_bound(half);
        let max = self.max_bound(half);
        if min >= max {
            return self.center();
        }
        let x = self.random_range(min, max);
        let y = self.random_range(min, max);
        Vec2::new(x, y)
    }

    /// Moves `id` to a random valid teleport target. Returns false, leaving
    /// the player in place, if `attempts` candidates all fail.
    pub fn try_random_teleport(&mut self, id: PlayerId, attempts: u32) -> bool {
        let radius = self.tuning.player_radius_px;
        for _ in 0..attempts {
            let candidate = self.random_point_inside(radius);
            if self.is_valid_teleport(candidate, id) {
                if let Some(player) = self.players.get_mut(&id) {
                    player.position = candidate;
                }
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ClassKind;

    fn roster(n: u32) -> Vec<RosterEntry> {
        (1..=n)
            .map(|i| {
                let class = ClassKind::ALL[(i % 3) as usize];
                RosterEntry::new(format!("c{i}"), i, format!("P{i}"), class)
            })
            .collect()
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn sizes_map_and_spawns_inside() {
            let arena = Arena::new(&roster(10), Tuning::default(), 1);

            assert_eq!(arena.map().cells_per_side, 31);
            assert_eq!(arena.alive_count(), 10);
            assert_eq!(arena.tick(), 0);
            for player in arena.players() {
                assert!(arena.in_bounds(player.position));
                assert!((player.wander.dir.length() - 1.0).abs() < 1e-4);
            }
        }

        #[test]
        fn same_seed_same_spawns() {
            let a = Arena::new(&roster(4), Tuning::default(), 99);
            let b = Arena::new(&roster(4), Tuning::default(), 99);
            let c = Arena::new(&roster(4), Tuning::default(), 100);

            let pos = |arena: &Arena| arena.players().map(|p| p.position).collect::<Vec<_>>();
            assert_eq!(pos(&a), pos(&b));
            assert_ne!(pos(&a), pos(&c));
        }

        #[test]
        fn connection_lookup() {
            let arena = Arena::new(&roster(3), Tuning::default(), 1);
            assert_eq!(
                arena.player_id_of(&ConnectionId::from("c2")),
                Some(PlayerId::new(2))
            );
            assert_eq!(arena.player_id_of(&ConnectionId::from("nope")), None);
        }
    }

    mod roster_tests {
        use super::*;

        #[test]
        fn remove_player_drops_queued_damage() {
            let mut arena = Arena::new(&roster(3), Tuning::default(), 1);
            arena.queue_damage(PlayerId::new(2), 300.0);

            let removed = arena.remove_player(&ConnectionId::from("c2"));

            assert_eq!(removed.map(|p| p.id), Some(PlayerId::new(2)));
            assert_eq!(arena.queued_damage(PlayerId::new(2)), 0.0);
            assert!(arena.player(PlayerId::new(2)).is_none());
            assert!(arena.remove_player(&ConnectionId::from("c2")).is_none());
        }

        #[test]
        fn damage_accumulates() {
            let mut arena = Arena::new(&roster(2), Tuning::default(), 1);
            arena.queue_damage(PlayerId::new(1), 100.0);
            arena.queue_damage(PlayerId::new(1), 25.0);
            assert_eq!(arena.queued_damage(PlayerId::new(1)), 125.0);
        }

        #[test]
        fn hazard_ids_are_monotonic() {
            let mut arena = Arena::new(&roster(2), Tuning::default(), 1);
            let area = Square::new(Vec2::splat(50.0), 10.0);
            let a = arena.spawn_hazard(HazardKind::Fire, area, HazardPhase::Active { until: None });
            let b = arena.spawn_hazard(HazardKind::Meteor, area, HazardPhase::Expired);
            assert!(a < b);
            assert_eq!(arena.hazards().count(), 2);
        }
    }

    mod geometry_tests {
        use super::*;

        #[test]
        fn clamp_respects_radius_and_padding() {
            let arena = Arena::new(&roster(2), Tuning::default(), 1);
            let size = arena.map().size_px;

            assert_eq!(arena.clamp_to_map(Vec2::new(-50.0, 3.0)), Vec2::new(8.0, 8.0));
            assert_eq!(
                arena.clamp_to_map(Vec2::new(size + 10.0, size)),
                Vec2::splat(size - 8.0)
            );
        }

        #[test]
        fn fire_blocks_teleport() {
            let mut arena = Arena::new(&roster(1), Tuning::default(), 1);
            let spot = Vec2::new(100.0, 100.0);
            if let Some(player) = arena.player_mut(PlayerId::new(1)) {
                player.position = Vec2::new(300.0, 300.0);
            }
            assert!(arena.is_valid_teleport(spot, PlayerId::new(1)));

            arena.spawn_hazard(
                HazardKind::Fire,
                Square::new(spot, 20.0),
                HazardPhase::Active { until: None },
            );
            assert!(arena.is_in_fire(spot));
            assert!(!arena.is_valid_teleport(spot, PlayerId::new(1)));
        }

        #[test]
        fn pending_fire_does_not_burn() {
            let mut arena = Arena::new(&roster(1), Tuning::default(), 1);
            arena.spawn_hazard(
                HazardKind::Fire,
                Square::new(Vec2::splat(100.0), 20.0),
                HazardPhase::Pending {
                    triggers_at: 50,
                    then_until: None,
                },
            );
            assert!(!arena.is_in_fire(Vec2::splat(100.0)));
        }

        #[test]
        fn crowded_spot_blocks_teleport() {
            let mut arena = Arena::new(&roster(2), Tuning::default(), 1);
            if let Some(player) = arena.player_mut(PlayerId::new(1)) {
                player.position = Vec2::new(250.0, 250.0);
            }
            if let Some(player) = arena.player_mut(PlayerId::new(2)) {
                player.position = Vec2::new(100.0, 100.0);
            }
            assert!(!arena.is_valid_teleport(Vec2::new(105.0, 100.0), PlayerId::new(1)));
            assert!(arena.is_valid_teleport(Vec2::new(108.0, 100.0), PlayerId::new(1)));
            // A player never blocks its own target.
            assert!(arena.is_valid_teleport(Vec2::new(105.0, 100.0), PlayerId::new(2)));
        }

        #[test]
        fn oversized_square_uses_center() {
            let mut arena = Arena::new(&roster(1), Tuning::default(), 1);
            let center = arena.center();
            assert_eq!(arena.random_square_center(10_000.0), center);
        }

        #[test]
        fn random_square_fits_inside() {
            let mut arena = Arena::new(&roster(2), Tuning::default(), 5);
            for _ in 0..100 {
                let c = arena.random_square_center(80.0);
                assert!(c.x - 40.0 >= 4.0 && c.x + 40.0 <= arena.map().size_px - 4.0);
                assert!(c.y - 40.0 >= 4.0 && c.y + 40.0 <= arena.map().size_px - 4.0);
            }
        }

        #[test]
        fn normalize_handles_zero() {
            let mut arena = Arena::new(&roster(1), Tuning::default(), 1);
            let dir = arena.normalize_or_random(Vec2::ZERO);
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert_eq!(arena.normalize_or_random(Vec2::new(3.0, 4.0)), Vec2::new(0.6, 0.8));
        }
    }
}
