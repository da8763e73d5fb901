//! Transient pickups.
//!
//! Items appear in batches, sit on the map until their expiry tick, and are
//! consumed whole by the first alive player (in id order) that touches them.

use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::entity::Player;

/// Monotonic item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// The five pickup kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// +attack damage, capped
    Sword,
    /// +movement speed, capped
    Boots,
    /// -attack cooldown, floored
    Amulet,
    /// +max hp, healing the same amount
    Armor,
    /// Fire immunity
    Blessing,
}

impl ItemKind {
    /// Rolls a kind with weights 30/25/20/15/10 percent.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f32 = rng.gen();
        if roll < 0.30 {
            Self::Sword
        } else if roll < 0.55 {
            Self::Boots
        } else if roll < 0.75 {
            Self::Amulet
        } else if roll < 0.90 {
            Self::Armor
        } else {
            Self::Blessing
        }
    }

    /// Applies this item's effect to `player` and bumps its counter.
    pub fn apply(self, player: &mut Player, tuning: &Tuning) {
        match self {
            Self::Sword => {
                player.combat.attack_damage = (player.combat.attack_damage
                    + tuning.sword_attack_bonus)
                    .min(tuning.max_attack_damage);
            }
            Self::Boots => {
                let max = tuning.per_tick(tuning.max_speed_px_per_second);
                let bonus = tuning.per_tick(tuning.boots_speed_bonus_px_per_second);
                player.combat.speed_per_tick = (player.combat.speed_per_tick + bonus).min(max);
            }
            Self::Amulet => {
                player.combat.cooldown_max = player
                    .combat
                    .cooldown_max
                    .saturating_sub(tuning.amulet_cooldown_reduction_ticks)
                    .max(tuning.min_attack_cooldown_ticks);
            }
            Self::Armor => {
                let vitals = &mut player.vitals;
                vitals.max_hp += tuning.armor_max_hp_bonus;
                vitals.hp = (vitals.hp + tuning.armor_max_hp_bonus).min(vitals.max_hp);
            }
            Self::Blessing => {}
        }
        player.items.record(self);
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sword => "sword",
            Self::Boots => "boots",
            Self::Amulet => "amulet",
            Self::Armor => "armor",
            Self::Blessing => "blessing",
        };
        f.write_str(name)
    }
}

/// An item lying on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier
    pub id: ItemId,
    /// Kind
    pub kind: ItemKind,
    /// Center
    pub position: Vec2,
    /// Pickup radius
    pub radius: f32,
    /// Removed by cleanup once the tick reaches this value.
    pub expires_at: u64,
}

impl Item {
    /// Returns true if a player body at `pos` touches the item.
    #[must_use]
    pub fn touches(&self, pos: Vec2, player_radius: f32) -> bool {
        pos.distance(self.position) <= player_radius + self.radius
    }
}
