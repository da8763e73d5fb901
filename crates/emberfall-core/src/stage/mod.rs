//! The ordered per-tick stage pipeline.
//!
//! Each step runs the stages returned by [`pipeline`] in order, then the
//! [`Simulation`](crate::simulation::Simulation) handles snapshot emission and
//! the end check itself.
//!
//! | # | stage                  | effect                                             |
//! |---|------------------------|----------------------------------------------------|
//! | 1 | [`HazardSpawn`]        | meteor waves and random fire zones                 |
//! | 2 | [`ItemSpawn`]          | item batches                                       |
//! | 3 | [`RingShrink`]         | schedule the next outer ring to ignite             |
//! | 4 | [`RingActivation`]     | ignite due ring cells                              |
//! | 5 | [`Movement`]           | escape / item / chase / wander                     |
//! | 6 | [`Separation`]         | pairwise soft push-apart                           |
//! | 7 | [`DangerNudge`]        | small extra push out of danger                     |
//! | 8 | [`MeteorImpact`]       | queue meteor damage, leave craters                 |
//! | 9 | [`ItemCollection`]     | first touching player takes the item               |
//! |10 | [`AttackSchedule`]     | cooldowns, melee hits, knockback                   |
//! |11 | [`FireExposure`]       | fire damage, sorceress teleport                    |
//! |12 | [`DamageResolution`]   | shields, abilities, deaths, low-hp escape          |
//! |13 | [`Cleanup`]            | drop expired hazards and items                     |
//!
//! # Invariants
//!
//! - Stages only touch the [`Arena`]; they never emit outputs.
//! - Damage is only queued before stage 12 and only applied in stage 12.
//! - Player positions leave every stage inside the clamped map band.

mod cleanup;
mod combat;
mod damage;
mod hazards;
mod items;
mod movement;

pub use cleanup::Cleanup;
pub use combat::{AttackSchedule, FireExposure};
pub use damage::DamageResolution;
pub use hazards::{HazardSpawn, MeteorImpact, RingActivation, RingShrink};
pub use items::{ItemCollection, ItemSpawn};
pub use movement::{DangerNudge, Movement, Separation};

use crate::arena::Arena;

/// One ordered step of the tick.
///
/// # Example
///
/// ```
/// use emberfall_core::arena::Arena;
/// use emberfall_core::stage::Stage;
///
/// struct CountTicks;
///
/// impl Stage for CountTicks {
///     fn name(&self) -> &'static str {
///         "count_ticks"
///     }
///
///     fn run(&self, arena: &mut Arena) {
///         let _ = arena.tick();
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Applies this stage to the arena for the current tick.
    fn run(&self, arena: &mut Arena);
}

/// The thirteen world-mutating stages in execution order.
#[must_use]
pub fn pipeline() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(HazardSpawn),
        Box::new(ItemSpawn),
        Box::new(RingShrink),
        Box::new(RingActivation),
        Box::new(Movement),
        Box::new(Separation),
        Box::new(DangerNudge),
        Box::new(MeteorImpact),
        Box::new(ItemCollection),
        Box::new(AttackSchedule),
        Box::new(FireExposure),
        Box::new(DamageResolution),
        Box::new(Cleanup),
    ]
}

/// Returns true on positive multiples of `every`.
pub(crate) fn is_due(tick: u64, every: u64) -> bool {
    tick > 0 && every > 0 && tick % every == 0
}
