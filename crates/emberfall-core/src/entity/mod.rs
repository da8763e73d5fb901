//! Player identity and state.
//!
//! - [`PlayerId`]: room-scoped sequential id, the engine's iteration order
//! - [`ConnectionId`]: stable per-connection key used by the outside world
//! - [`ClassKind`]: the three archetypes and their one-shot abilities
//! - [`Player`]: the complete per-player record
//!
//! # Example
//!
//! ```
//! use emberfall_core::entity::{ClassKind, ConnectionId, PlayerId, RosterEntry};
//!
//! let entry = RosterEntry::new("conn-a", 1, "Ash", ClassKind::Barbarian);
//! assert_eq!(entry.player_id, PlayerId::new(1));
//! assert_eq!(entry.connection_id, ConnectionId::from("conn-a"));
//! ```

pub mod components;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Tuning;

pub use components::{AbilityFlags, CombatStats, ItemCounts, Vitals, WanderState};

/// Room-scoped sequential player identifier.
///
/// Ordering by `PlayerId` is the engine's canonical per-player order: every
/// loop over players, the damage queue, and all final tie-breaks use it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Opaque per-connection key assigned by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wraps a connection key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Player archetype.
///
/// - `Barbarian`: shield on the first hit taken
/// - `Paladin`: one heal when hp crosses down through a trigger value
/// - `Sorceress`: teleports out after standing in fire long enough
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    /// Fire-escape teleport
    Sorceress,
    /// Threshold heal
    Paladin,
    /// First-hit shield
    Barbarian,
}

impl ClassKind {
    /// All archetypes in roster rotation order.
    pub const ALL: [Self; 3] = [Self::Sorceress, Self::Paladin, Self::Barbarian];
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sorceress => write!(f, "sorceress"),
            Self::Paladin => write!(f, "paladin"),
            Self::Barbarian => write!(f, "barbarian"),
        }
    }
}

/// One line of the initial roster handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Transport key
    pub connection_id: ConnectionId,
    /// Sequential id
    pub player_id: PlayerId,
    /// Display name
    pub name: String,
    /// Archetype
    pub class: ClassKind,
}

impl RosterEntry {
    /// Convenience constructor.
    #[must_use]
    pub fn new(
        connection_id: impl Into<ConnectionId>,
        player_id: u32,
        name: impl Into<String>,
        class: ClassKind,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            player_id: PlayerId::new(player_id),
            name: name.into(),
            class,
        }
    }
}

/// A participant in the match.
///
/// Once `alive` is false it stays false, `hp` is 0 and `death_tick` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Sequential id
    pub id: PlayerId,
    /// Transport key
    pub connection_id: ConnectionId,
    /// Display name
    pub name: String,
    /// Archetype
    pub class: ClassKind,
    /// Continuous world position
    pub position: Vec2,
    /// Hp, max hp, shield
    pub vitals: Vitals,
    /// Attack and movement stats
    pub combat: CombatStats,
    /// Pickup counters
    pub items: ItemCounts,
    /// Wander heading
    pub wander: WanderState,
    /// Spent one-shot abilities
    pub abilities: AbilityFlags,
    /// Consecutive ticks spent in fire (only grows for sorceresses).
    pub fire_ticks: u32,
    /// Lifecycle flag
    pub alive: bool,
    /// Tick of death, if dead.
    pub death_tick: Option<u64>,
}

impl Player {
    /// Builds a fresh player from its roster line with base stats.
    #[must_use]
    pub fn spawn(entry: &RosterEntry, position: Vec2, wander_dir: Vec2, tuning: &Tuning) -> Self {
        Self {
            id: entry.player_id,
            connection_id: entry.connection_id.clone(),
            name: entry.name.clone(),
            class: entry.class,
            position,
            vitals: Vitals::full(tuning.hp_max),
            combat: CombatStats {
                attack_damage: tuning.attack_damage,
                cooldown: 0,
                cooldown_max: tuning.attack_cooldown_ticks,
                speed_per_tick: tuning.per_tick(tuning.speed_px_per_second),
            },
            items: ItemCounts::default(),
            wander: WanderState {
                dir: wander_dir,
                ticks_left: tuning.wander_change_ticks,
            },
            abilities: AbilityFlags::empty(),
            fire_ticks: 0,
            alive: true,
            death_tick: None,
        }
    }

    /// Marks the player dead at `tick`. Hp is clamped to 0.
    pub fn kill(&mut self, tick: u64) {
        self.vitals.hp = 0.0;
        self.alive = false;
        self.death_tick = Some(tick);
    }
}
