//! Gameplay tuning.
//!
//! Every constant the engine consults lives in [`Tuning`]. The defaults are
//! the canonical Emberfall ruleset; a JSON override only needs the fields it
//! changes (`#[serde(default)]`).
//!
//! # Example
//!
//! ```
//! use emberfall_core::config::Tuning;
//!
//! let tuning: Tuning = serde_json::from_str(r#"{ "meteor_damage": 3000.0 }"#).unwrap();
//! assert_eq!(tuning.meteor_damage, 3000.0);
//! assert_eq!(tuning.tick_rate, 20);
//! assert!(tuning.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::output::MapInfo;

// =============================================================================
// Tuning
// =============================================================================

/// All gameplay constants for one match.
///
/// Lengths are in world pixels, durations in ticks unless the field name says
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // --- cadence ---
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// A snapshot is emitted on every tick divisible by this.
    pub snapshot_every_ticks: u64,

    // --- map ---
    /// Side length of one map grid cell.
    pub grid_cell_px: f32,
    /// Keep-out band along every wall.
    pub wall_padding_px: f32,
    /// Bucket size of the per-tick spatial hash.
    pub spatial_cell_px: f32,

    // --- player base stats ---
    /// Starting and baseline maximum hp.
    pub hp_max: f32,
    /// Starting attack damage.
    pub attack_damage: f32,
    /// Attack damage ceiling (swords stop stacking here).
    pub max_attack_damage: f32,
    /// Player body radius.
    pub player_radius_px: f32,
    /// Starting movement speed.
    pub speed_px_per_second: f32,
    /// Movement speed ceiling (boots stop stacking here).
    pub max_speed_px_per_second: f32,
    /// Chase range for the movement AI.
    pub detection_range_px: f32,
    /// Reach of a melee attack.
    pub attack_range_px: f32,
    /// Starting attack cooldown.
    pub attack_cooldown_ticks: u32,
    /// Attack cooldown floor (amulets stop stacking here).
    pub min_attack_cooldown_ticks: u32,
    /// How long a wander heading is kept.
    pub wander_change_ticks: u32,
    /// Distance a hit pushes its target.
    pub knockback_px: f32,

    // --- low-hp escape (all classes) ---
    /// Fraction of max hp whose downward crossing triggers the escape.
    pub low_hp_trigger_ratio: f32,
    /// Minimum escape distance from the nearest enemy.
    pub low_hp_teleport_min_px: f32,
    /// Maximum escape distance from the nearest enemy.
    pub low_hp_teleport_max_px: f32,
    /// Candidate positions tried per search.
    pub low_hp_teleport_attempts: u32,
    /// Attack cooldown floor applied after escaping.
    pub low_hp_attack_lock_ticks: u32,

    // --- hazards ---
    /// Direct hit damage of a meteor.
    pub meteor_damage: f32,
    /// Ticks between meteor waves.
    pub meteor_interval_ticks: u64,
    /// Side of a meteor's impact square.
    pub meteor_area_px: f32,
    /// Telegraph time between a meteor appearing and its impact.
    pub meteor_warning_ticks: u64,
    /// How long the crater stays visible after impact.
    pub meteor_linger_ticks: u64,
    /// Fire damage per second of exposure, per overlapping zone.
    pub fire_damage_per_second: f32,
    /// Ticks between random fire zones.
    pub fire_interval_ticks: u64,
    /// Lifetime of a random fire zone.
    pub fire_duration_ticks: u64,
    /// Side of a random fire zone.
    pub fire_area_px: f32,

    // --- shrinking ring ---
    /// Tick of the first shrink.
    pub shrink_start_ticks: u64,
    /// Ticks between subsequent shrinks.
    pub shrink_step_ticks: u64,
    /// Warning time before a shrunk ring ignites.
    pub shrink_warning_ticks: u64,
    /// The ring never shrinks the safe area below this many cells per side.
    pub shrink_min_safe_cells: u32,

    // --- avoidance ---
    /// Extra band around fire that already counts as danger.
    pub fire_escape_margin_px: f32,
    /// Distance from the wall bound that counts as danger.
    pub wall_escape_margin_px: f32,
    /// Speed multiplier while escaping danger.
    pub danger_escape_speed_multiplier: f32,
    /// Scale applied to half the overlap when separating two players.
    pub separation_push_multiplier: f32,
    /// Smallest separation push.
    pub separation_min_push_px: f32,
    /// Gap kept between two player bodies.
    pub separation_gap_px: f32,

    // --- class abilities ---
    /// Shield granted to a barbarian on the first hit.
    pub barbarian_shield: f32,
    /// Hp a paladin must cross downward to trigger the heal.
    pub paladin_trigger_hp: f32,
    /// Hp a paladin is restored to.
    pub paladin_heal_to_hp: f32,
    /// Consecutive in-fire ticks before a sorceress teleports.
    pub sorceress_fire_teleport_ticks: u32,
    /// Random positions a sorceress tries before falling back to the center.
    pub sorceress_teleport_attempts: u32,

    // --- items ---
    /// Pickup radius of an item.
    pub item_radius_px: f32,
    /// Range within which the AI walks toward an item.
    pub item_detection_range_px: f32,
    /// Ticks between item batches.
    pub item_spawn_interval_ticks: u64,
    /// Lifetime of an unclaimed item.
    pub item_ttl_ticks: u64,
    /// Ceiling on items present at once.
    pub max_items: usize,
    /// Random positions tried to keep an item out of fire.
    pub item_spawn_attempts: u32,
    /// Attack damage added by a sword.
    pub sword_attack_bonus: f32,
    /// Speed added by boots.
    pub boots_speed_bonus_px_per_second: f32,
    /// Cooldown ticks removed by an amulet.
    pub amulet_cooldown_reduction_ticks: u32,
    /// Max hp added (and healed) by armor.
    pub armor_max_hp_bonus: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            snapshot_every_ticks: 2,

            grid_cell_px: 16.0,
            wall_padding_px: 4.0,
            spatial_cell_px: 32.0,

            hp_max: 10_000.0,
            attack_damage: 500.0,
            max_attack_damage: 1200.0,
            player_radius_px: 4.0,
            speed_px_per_second: 30.0,
            max_speed_px_per_second: 55.0,
            detection_range_px: 55.0,
            attack_range_px: 11.0,
            attack_cooldown_ticks: 30,
            min_attack_cooldown_ticks: 12,
            wander_change_ticks: 16,
            knockback_px: 5.0,

            low_hp_trigger_ratio: 0.5,
            low_hp_teleport_min_px: 96.0,
            low_hp_teleport_max_px: 160.0,
            low_hp_teleport_attempts: 24,
            low_hp_attack_lock_ticks: 10,

            meteor_damage: 2500.0,
            meteor_interval_ticks: 160,
            meteor_area_px: 80.0,
            meteor_warning_ticks: 10,
            meteor_linger_ticks: 5,
            fire_damage_per_second: 500.0,
            fire_interval_ticks: 200,
            fire_duration_ticks: 100,
            fire_area_px: 160.0,

            shrink_start_ticks: 1200,
            shrink_step_ticks: 600,
            shrink_warning_ticks: 100,
            shrink_min_safe_cells: 8,

            fire_escape_margin_px: 6.0,
            wall_escape_margin_px: 16.0,
            danger_escape_speed_multiplier: 1.25,
            separation_push_multiplier: 1.7,
            separation_min_push_px: 0.8,
            separation_gap_px: 2.0,

            barbarian_shield: 5000.0,
            paladin_trigger_hp: 2000.0,
            paladin_heal_to_hp: 8000.0,
            sorceress_fire_teleport_ticks: 20,
            sorceress_teleport_attempts: 20,

            item_radius_px: 4.0,
            item_detection_range_px: 40.0,
            item_spawn_interval_ticks: 60,
            item_ttl_ticks: 300,
            max_items: 12,
            item_spawn_attempts: 30,
            sword_attack_bonus: 100.0,
            boots_speed_bonus_px_per_second: 5.0,
            amulet_cooldown_reduction_ticks: 2,
            armor_max_hp_bonus: 2000.0,
        }
    }
}

impl Tuning {
    /// Checks that the table can drive a match without dividing by zero,
    /// taking a modulo by zero, or sampling an empty range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }

        for (field, value) in [
            ("snapshot_every_ticks", self.snapshot_every_ticks),
            ("meteor_interval_ticks", self.meteor_interval_ticks),
            ("fire_interval_ticks", self.fire_interval_ticks),
            ("item_spawn_interval_ticks", self.item_spawn_interval_ticks),
            ("shrink_step_ticks", self.shrink_step_ticks),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }

        for (field, value) in [
            ("grid_cell_px", self.grid_cell_px),
            ("spatial_cell_px", self.spatial_cell_px),
            ("hp_max", self.hp_max),
            ("player_radius_px", self.player_radius_px),
            ("speed_px_per_second", self.speed_px_per_second),
            ("wall_escape_margin_px", self.wall_escape_margin_px),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let ranges = [
            (
                "low_hp_teleport_px",
                self.low_hp_teleport_min_px,
                self.low_hp_teleport_max_px,
            ),
            (
                "attack_damage",
                self.attack_damage,
                self.max_attack_damage,
            ),
            (
                "speed_px_per_second",
                self.speed_px_per_second,
                self.max_speed_px_per_second,
            ),
            (
                "attack_cooldown_ticks",
                self.min_attack_cooldown_ticks as f32,
                self.attack_cooldown_ticks as f32,
            ),
        ];
        for (field, min, max) in ranges {
            if min > max {
                return Err(ConfigError::InvertedRange { field, min, max });
            }
        }

        Ok(())
    }

    /// Fire damage applied per tick by one zone.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fire_damage_per_tick(&self) -> f32 {
        self.fire_damage_per_second / self.tick_rate as f32
    }

    /// Converts a per-second rate to a per-tick rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn per_tick(&self, per_second: f32) -> f32 {
        per_second / self.tick_rate as f32
    }

    /// Player body diameter.
    #[must_use]
    pub fn player_diameter(&self) -> f32 {
        self.player_radius_px * 2.0
    }

    /// Wall-clock length of one tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Map dimensions for a roster of `players`:
    /// `cells_per_side = ceil(12 + 6 * sqrt(players))`.
    ///
    /// ```
    /// use emberfall_core::config::Tuning;
    ///
    /// let map = Tuning::default().map_for(10);
    /// assert_eq!(map.cells_per_side, 31);
    /// assert_eq!(map.size_px, 496.0);
    /// ```
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn map_for(&self, players: usize) -> MapInfo {
        let cells_per_side = (12.0 + 6.0 * (players as f64).sqrt()).ceil() as u32;
        MapInfo {
            size_px: cells_per_side as f32 * self.grid_cell_px,
            cells_per_side,
        }
    }
}
