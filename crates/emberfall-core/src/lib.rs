//! # Emberfall Core
//!
//! Authoritative fixed-tick simulation for Emberfall, a last-player-standing
//! arena battle between AI-controlled players.
//!
//! A match is built from a roster and a seed. Each tick runs an ordered
//! pipeline of stages (hazards, items, the shrinking ring, movement, combat,
//! damage, cleanup) over one owned [`Arena`], then emits periodic snapshots
//! and, once at most one player is left, a final ranking.
//!
//! ## Layout
//!
//! - [`arena`]: world state and shared geometry/random helpers
//! - [`stage`]: the thirteen per-tick stages
//! - [`simulation`]: step orchestration, snapshots, ending
//! - [`driver`]: tokio interval driver with broadcast outputs
//! - [`output`]: wire-shaped snapshot and end messages
//! - [`digest`]: state hashing for determinism checks
//!
//! ## Usage
//!
//! ```
//! use emberfall_core::{ClassKind, RosterEntry, Simulation};
//!
//! let roster: Vec<_> = (1..=6)
//!     .map(|i| RosterEntry::new(format!("conn-{i}"), i, format!("Bot {i}"), ClassKind::ALL[i as usize % 3]))
//!     .collect();
//! let mut sim = Simulation::new(&roster, 2024);
//!
//! let mut ranking = None;
//! while ranking.is_none() && sim.tick() < 200_000 {
//!     ranking = sim.step().into_iter().find_map(|output| output.as_end().cloned());
//! }
//! let ranking = ranking.expect("match ends");
//! assert_eq!(ranking.winner().map(|entry| entry.position), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod digest;
pub mod driver;
pub mod entity;
pub mod error;
pub mod hazard;
pub mod item;
pub mod output;
pub mod ranking;
pub mod simulation;
pub mod stage;
pub mod targeting;

pub use arena::Arena;
pub use config::Tuning;
pub use driver::{MatchDriver, MatchPhase};
pub use entity::{ClassKind, ConnectionId, Player, PlayerId, RosterEntry};
pub use error::{ConfigError, DriverError};
pub use output::{MatchResult, Output, RankEntry, Snapshot};
pub use simulation::Simulation;

#[cfg(test)]
mod tests;
