//! Outbound messages produced by the engine.
//!
//! The engine never talks to a transport. Each step returns a list of
//! [`Output`]s which the caller forwards however it likes (the
//! [`MatchDriver`](crate::driver::MatchDriver) publishes them on a broadcast
//! channel).
//!
//! Field names serialize in camelCase to match the client protocol.
//!
//! # Example
//!
//! ```
//! use emberfall_core::output::{MapInfo, Output, MatchResult};
//!
//! let end = Output::End(MatchResult { ranking: vec![] });
//! let json = serde_json::to_string(&end).unwrap();
//! assert!(json.contains(r#""type":"end""#));
//!
//! let map = MapInfo { size_px: 336.0, cells_per_side: 21 };
//! assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"sizePx":336.0,"cellsPerSide":21}"#);
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::{ClassKind, ConnectionId, ItemCounts, PlayerId};
use crate::hazard::{HazardId, HazardKind};
use crate::item::{ItemId, ItemKind};

// =============================================================================
// Output
// =============================================================================

/// A message emitted by a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Output {
    /// Periodic world projection
    Snapshot(Snapshot),
    /// Final ranking, emitted exactly once
    End(MatchResult),
}

impl Output {
    /// Returns the snapshot, if this is one.
    #[must_use]
    pub fn as_snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Snapshot(snapshot) => Some(snapshot),
            Self::End(_) => None,
        }
    }

    /// Returns the match result, if this is one.
    #[must_use]
    pub fn as_end(&self) -> Option<&MatchResult> {
        match self {
            Self::End(result) => Some(result),
            Self::Snapshot(_) => None,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Fixed map dimensions, computed once from the roster size.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    /// Side length in pixels
    pub size_px: f32,
    /// Side length in grid cells
    pub cells_per_side: u32,
}

/// Read-only projection of the world after the step's cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Wall-clock milliseconds since the Unix epoch at emission.
    pub server_timestamp: u64,
    /// Tick the projection was taken on.
    pub tick: u64,
    /// Alive players in id order.
    pub players: Vec<PlayerView>,
    /// Hazards in id order.
    pub hazards: Vec<HazardView>,
    /// Items in id order.
    pub items: Vec<ItemView>,
    /// Pickups since the previous snapshot.
    pub pickup_events: Vec<PickupEvent>,
    /// Map dimensions.
    pub map: MapInfo,
}

/// One alive player as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Connection key
    pub id: ConnectionId,
    /// Sequential id
    pub player_id: PlayerId,
    /// Display name
    pub name: String,
    /// Archetype
    pub class: ClassKind,
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Hit points
    pub hp: f32,
    /// Maximum hit points
    pub max_hp: f32,
    /// Shield
    pub shield: f32,
    /// Attack damage
    pub attack_damage: f32,
    /// Speed rounded to whole pixels per second
    pub speed_per_second: u32,
    /// Attack cooldown stat (the reset value, not the running counter)
    pub attack_cooldown_ticks: u32,
    /// Pickup counters
    #[serde(flatten)]
    pub item_counts: ItemCounts,
}

/// One hazard as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardView {
    /// Identifier
    pub id: HazardId,
    /// Displayed kind
    pub kind: HazardKind,
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
    /// Side length
    pub size: f32,
    /// Remaining ticks, `None` for permanent fire
    pub ttl_ticks: Option<u64>,
}

/// One item as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// Identifier
    pub id: ItemId,
    /// Kind
    pub kind: ItemKind,
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
    /// Pickup radius
    pub radius: f32,
    /// Remaining ticks
    pub ttl_ticks: u64,
}

/// Record of one item pickup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupEvent {
    /// Monotonic event id
    pub id: u64,
    /// Connection key of the picker
    pub connection_id: ConnectionId,
    /// Sequential id of the picker
    pub player_id: PlayerId,
    /// Display name of the picker
    pub player_name: String,
    /// Kind picked up
    pub item_kind: ItemKind,
    /// Tick of the pickup
    pub tick: u64,
}

// =============================================================================
// Match result
// =============================================================================

/// Final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Players best first.
    pub ranking: Vec<RankEntry>,
}

impl MatchResult {
    /// Returns the first-placed entry, if any.
    #[must_use]
    pub fn winner(&self) -> Option<&RankEntry> {
        self.ranking.first()
    }
}

/// One line of the final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    /// 1-based position; tied players share one
    pub position: u32,
    /// Connection key
    pub id: ConnectionId,
    /// Sequential id
    pub player_id: PlayerId,
    /// Display name
    pub name: String,
    /// Archetype
    pub class: ClassKind,
    /// Remaining hit points
    pub hp: f32,
    /// Maximum hit points
    pub max_hp: f32,
    /// Tick of death, `None` if alive at the end
    pub death_tick: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_view_flattens_item_counts() {
        let view = PlayerView {
            id: ConnectionId::from("c1"),
            player_id: PlayerId::new(1),
            name: "Ash".into(),
            class: ClassKind::Barbarian,
            x: 1.0,
            y: 2.0,
            hp: 10.0,
            max_hp: 10.0,
            shield: 0.0,
            attack_damage: 500.0,
            speed_per_second: 30,
            attack_cooldown_ticks: 30,
            item_counts: ItemCounts {
                swords: 2,
                ..ItemCounts::default()
            },
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["playerId"], 1);
        assert_eq!(value["speedPerSecond"], 30);
        assert_eq!(value["swords"], 2);
        assert_eq!(value["class"], "barbarian");
    }

    #[test]
    fn permanent_fire_serializes_null_ttl() {
        let view = HazardView {
            id: HazardId::new(4),
            kind: HazardKind::Fire,
            x: 8.0,
            y: 8.0,
            size: 16.0,
            ttl_ticks: None,
        };
        let value = serde_json::to_value(&view).unwrap();
        assert!(value["ttlTicks"].is_null());
        assert_eq!(value["kind"], "fire");
    }

    #[test]
    fn output_accessors() {
        let end = Output::End(MatchResult { ranking: vec![] });
        assert!(end.as_snapshot().is_none());
        assert!(end.as_end().is_some_and(|result| result.winner().is_none()));
    }
}
