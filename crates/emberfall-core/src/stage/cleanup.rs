//! End-of-tick expiry.

use super::Stage;
use crate::arena::Arena;
use crate::hazard::HazardPhase;

/// Stage 13: expires hazards whose `until` has arrived and drops them, then
/// drops items whose lifetime has run out. Permanent fire is never removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cleanup;

impl Stage for Cleanup {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn run(&self, arena: &mut Arena) {
        let tick = arena.tick;
        for hazard in arena.hazards.values_mut() {
            hazard.expire_if_due(tick);
        }
        arena
            .hazards
            .retain(|_, hazard| hazard.phase != HazardPhase::Expired);
        arena.items.retain(|_, item| item.expires_at > tick);
    }
}
