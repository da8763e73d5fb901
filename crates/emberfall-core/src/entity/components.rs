//! Component structs grouped onto a [`Player`](super::Player).

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::item::ItemKind;

/// Hit points and shield.
///
/// All three values stay `>= 0`. Shield absorbs damage before hp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current hit points, `0..=max_hp`.
    pub hp: f32,
    /// Current maximum (armor raises it).
    pub max_hp: f32,
    /// Damage buffer consumed before hp.
    pub shield: f32,
}

impl Vitals {
    /// Full health, no shield.
    #[must_use]
    pub const fn full(max_hp: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            shield: 0.0,
        }
    }

    /// Absorbs as much of `incoming` as the shield holds and returns the
    /// remainder.
    pub fn absorb(&mut self, incoming: f32) -> f32 {
        let absorbed = self.shield.min(incoming);
        self.shield -= absorbed;
        incoming - absorbed
    }
}

/// Offensive stats and the attack timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Damage queued on a successful attack.
    pub attack_damage: f32,
    /// Ticks until the next attack is allowed.
    pub cooldown: u32,
    /// Value the cooldown resets to after an attack.
    pub cooldown_max: u32,
    /// Movement per tick.
    pub speed_per_tick: f32,
}

/// How many items of each kind a player has picked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemCounts {
    /// Swords
    pub swords: u32,
    /// Boots
    pub boots: u32,
    /// Amulets
    pub amulets: u32,
    /// Armors
    pub armors: u32,
    /// Blessings
    pub blessings: u32,
}

impl ItemCounts {
    /// Increments the counter for `kind`.
    pub fn record(&mut self, kind: ItemKind) {
        *self.slot(kind) += 1;
    }

    /// Returns the counter for `kind`.
    #[must_use]
    pub fn get(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::Sword => self.swords,
            ItemKind::Boots => self.boots,
            ItemKind::Amulet => self.amulets,
            ItemKind::Armor => self.armors,
            ItemKind::Blessing => self.blessings,
        }
    }

    fn slot(&mut self, kind: ItemKind) -> &mut u32 {
        match kind {
            ItemKind::Sword => &mut self.swords,
            ItemKind::Boots => &mut self.boots,
            ItemKind::Amulet => &mut self.amulets,
            ItemKind::Armor => &mut self.armors,
            ItemKind::Blessing => &mut self.blessings,
        }
    }
}

/// Heading used when nothing is worth chasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WanderState {
    /// Unit heading.
    pub dir: Vec2,
    /// Ticks before a fresh heading is rolled.
    pub ticks_left: u32,
}

bitflags! {
    /// One-shot abilities already spent this match.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AbilityFlags: u8 {
        /// Barbarian first-hit shield granted.
        const SHIELD_USED = 1 << 0;
        /// Paladin threshold heal consumed.
        const HEAL_USED = 1 << 1;
        /// Low-hp escape consumed (all classes).
        const ESCAPE_USED = 1 << 2;
    }
}

impl AbilityFlags {
    /// Marks `flag` as used and returns true if it was still available.
    pub fn claim(&mut self, flag: Self) -> bool {
        if self.contains(flag) {
            return false;
        }
        self.insert(flag);
        true
    }
}
