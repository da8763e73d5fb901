//! Area hazards: fire zones, meteors and shrinking-ring cells.
//!
//! Every hazard is one record whose [`HazardPhase`] carries its whole
//! lifecycle:
//!
//! ```text
//!   Pending { triggers_at, then_until } --due--> Active { until } --until <= tick--> Expired
//! ```
//!
//! | source      | kind   | created as                           | on trigger              |
//! |-------------|--------|--------------------------------------|-------------------------|
//! | fire spawn  | Fire   | `Active { until: Some(t + d) }`      | -                       |
//! | ring shrink | Fire   | `Pending { then_until: None }`       | burns forever           |
//! | meteor wave | Meteor | `Pending { then_until: Some(..) }`   | impact, crater lingers  |
//!
//! Only an active fire hurts anyone continuously. A pending ring cell is
//! shown to clients as a meteor marker (the warning visual).

use std::fmt;

use emberfall_grid::Square;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Monotonic hazard identifier shared by all hazard kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardId(u64);

impl HazardId {
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

impl fmt::Display for HazardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hazard-{}", self.0)
    }
}

/// What a hazard does once it triggers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    /// Persistent per-tick damage while active
    Fire,
    /// One-off area strike on impact
    Meteor,
}

/// Lifecycle stage of a hazard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardPhase {
    /// Telegraphed and harmless until `triggers_at`.
    Pending {
        /// Tick the hazard becomes active
        triggers_at: u64,
        /// Expiry once active (`None` = never)
        then_until: Option<u64>,
    },
    /// Triggered. Expires when the tick reaches `until`.
    Active {
        /// Expiry tick (`None` = never)
        until: Option<u64>,
    },
    /// Due for removal.
    Expired,
}

/// A square hazard on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Identifier
    pub id: HazardId,
    /// Kind
    pub kind: HazardKind,
    /// Affected area
    pub area: Square,
    /// Lifecycle stage
    pub phase: HazardPhase,
}

impl Hazard {
    /// Returns true for an active fire.
    #[must_use]
    pub fn is_burning(&self) -> bool {
        self.kind == HazardKind::Fire && matches!(self.phase, HazardPhase::Active { .. })
    }

    /// Returns true if an active fire covers `point`.
    #[must_use]
    pub fn burns(&self, point: Vec2) -> bool {
        self.is_burning() && self.area.contains(point)
    }

    /// Returns true if this is a pending `kind` hazard whose trigger tick has
    /// arrived.
    #[must_use]
    pub fn is_due(&self, kind: HazardKind, tick: u64) -> bool {
        self.kind == kind
            && matches!(self.phase, HazardPhase::Pending { triggers_at, .. } if triggers_at <= tick)
    }

    /// Moves a pending hazard to active. Other phases are left alone.
    pub fn activate(&mut self) {
        if let HazardPhase::Pending { then_until, .. } = self.phase {
            self.phase = HazardPhase::Active { until: then_until };
        }
    }

    /// Marks an active hazard expired once `tick` reaches its expiry.
    pub fn expire_if_due(&mut self, tick: u64) {
        if let HazardPhase::Active { until: Some(until) } = self.phase {
            if until <= tick {
                self.phase = HazardPhase::Expired;
            }
        }
    }

    /// Kind as shown to clients. A pending ring cell renders as a meteor
    /// marker.
    #[must_use]
    pub fn display_kind(&self) -> HazardKind {
        match (self.kind, self.phase) {
            (HazardKind::Fire, HazardPhase::Pending { .. }) => HazardKind::Meteor,
            (kind, _) => kind,
        }
    }

    /// Remaining visible lifetime at `tick`, `None` for permanent fire.
    ///
    /// A pending fire shows its warning countdown. A meteor shows its whole
    /// visual lifetime, telegraph and crater together.
    #[must_use]
    pub fn ttl(&self, tick: u64) -> Option<u64> {
        match (self.kind, self.phase) {
            (HazardKind::Fire, HazardPhase::Pending { triggers_at, .. }) => {
                Some(triggers_at.saturating_sub(tick))
            }
            (
                _,
                HazardPhase::Pending { then_until: until, .. } | HazardPhase::Active { until },
            ) => until.map(|until| until.saturating_sub(tick)),
            (_, HazardPhase::Expired) => Some(0),
        }
    }
}
