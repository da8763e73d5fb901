//! Tick orchestration.
//!
//! The `Simulation` owns the [`Arena`] and the ordered stage pipeline. Every
//! [`step`](Simulation::step):
//!
//! 1. advances the tick counter,
//! 2. runs the thirteen [`stage`](crate::stage) functions in order,
//! 3. emits a snapshot when the tick is a multiple of the snapshot cadence,
//! 4. ends the match once at most one player is alive.
//!
//! Ending emits a final snapshot followed by exactly one [`Output::End`]. After
//! that, `step` is a no-op returning nothing.
//!
//! # Example
//!
//! ```
//! use emberfall_core::entity::{ClassKind, RosterEntry};
//! use emberfall_core::output::Output;
//! use emberfall_core::simulation::Simulation;
//!
//! let roster = vec![
//!     RosterEntry::new("a", 1, "Ash", ClassKind::Barbarian),
//!     RosterEntry::new("b", 2, "Bryn", ClassKind::Sorceress),
//! ];
//! let mut sim = Simulation::new(&roster, 42);
//!
//! let outputs = sim.step();
//! assert_eq!(sim.tick(), 1);
//! assert!(outputs.is_empty());
//!
//! let outputs = sim.step();
//! assert!(matches!(outputs.as_slice(), [Output::Snapshot(_)]));
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, trace};

use crate::arena::Arena;
use crate::config::Tuning;
use crate::entity::{ConnectionId, RosterEntry};
use crate::error::ConfigError;
use crate::output::{HazardView, ItemView, MatchResult, Output, PlayerView, Snapshot};
use crate::ranking::rank;
use crate::stage::{pipeline, Stage};

// =============================================================================
// Simulation
// =============================================================================

/// One match: the world plus the pipeline that advances it.
pub struct Simulation {
    arena: Arena,
    stages: Vec<Box<dyn Stage>>,
    ended: bool,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("stages", &format!("[{} stages]", self.stages.len()))
            .field("ended", &self.ended)
            .finish()
    }
}

impl Simulation {
    /// Builds a match with the default tuning.
    #[must_use]
    pub fn new(roster: &[RosterEntry], seed: u64) -> Self {
        Self::from_arena(Arena::new(roster, Tuning::default(), seed))
    }

    /// Builds a match with a custom tuning table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the table fails [`Tuning::validate`].
    pub fn with_tuning(roster: &[RosterEntry], tuning: Tuning, seed: u64) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self::from_arena(Arena::new(roster, tuning, seed)))
    }

    /// Wraps an already-built arena.
    #[must_use]
    pub fn from_arena(arena: Arena) -> Self {
        info!(
            players = arena.players.len(),
            map_px = arena.map.size_px,
            cells = arena.map.cells_per_side,
            seed = arena.seed(),
            "match created"
        );
        Self {
            arena,
            stages: pipeline(),
            ended: false,
        }
    }

    /// Current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.arena.tick()
    }

    /// Returns true once the end output has been emitted.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Read access to the world.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable access to the world, for setting up scenarios.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Advances the match by one tick and returns whatever it emitted.
    pub fn step(&mut self) -> Vec<Output> {
        if self.ended {
            return Vec::new();
        }

        self.arena.advance_tick();
        let tick = self.arena.tick;

        for stage in &self.stages {
            trace!(tick, stage = stage.name(), "stage");
            stage.run(&mut self.arena);
        }

        let mut outputs = Vec::new();
        if tick % self.arena.tuning.snapshot_every_ticks.max(1) == 0 {
            outputs.push(Output::Snapshot(self.snapshot()));
        }
        if self.arena.alive_count() <= 1 {
            outputs.extend(self.finish());
        }
        outputs
    }

    /// Removes a disconnected player. Unknown or already-removed ids are
    /// ignored. Ends the match at once if at most one player remains alive.
    pub fn remove_player(&mut self, connection: &ConnectionId) -> Vec<Output> {
        if let Some(player) = self.arena.remove_player(connection) {
            info!(tick = self.arena.tick, player = %player.id, %connection, "player removed");
        }

        if !self.ended && self.arena.alive_count() <= 1 {
            return self.finish();
        }
        Vec::new()
    }

    /// Projects the current world and drains the pending pickup events.
    pub fn snapshot(&mut self) -> Snapshot {
        let arena = &mut self.arena;
        let tick = arena.tick;
        #[allow(clippy::cast_precision_loss)]
        let tick_rate = arena.tuning.tick_rate as f32;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let players = arena
            .players
            .values()
            .filter(|player| player.alive)
            .map(|player| PlayerView {
                id: player.connection_id.clone(),
                player_id: player.id,
                name: player.name.clone(),
                class: player.class,
                x: player.position.x,
                y: player.position.y,
                hp: player.vitals.hp,
                max_hp: player.vitals.max_hp,
                shield: player.vitals.shield,
                attack_damage: player.combat.attack_damage,
                speed_per_second: (player.combat.speed_per_tick * tick_rate).round() as u32,
                attack_cooldown_ticks: player.combat.cooldown_max,
                item_counts: player.items,
            })
            .collect();

        let hazards = arena
            .hazards
            .values()
            .map(|hazard| HazardView {
                id: hazard.id,
                kind: hazard.display_kind(),
                x: hazard.area.center.x,
                y: hazard.area.center.y,
                size: hazard.area.size,
                ttl_ticks: hazard.ttl(tick),
            })
            .collect();

        let items = arena
            .items
            .values()
            .map(|item| ItemView {
                id: item.id,
                kind: item.kind,
                x: item.position.x,
                y: item.position.y,
                radius: item.radius,
                ttl_ticks: item.expires_at.saturating_sub(tick),
            })
            .collect();

        Snapshot {
            server_timestamp: unix_millis(),
            tick,
            players,
            hazards,
            items,
            pickup_events: std::mem::take(&mut arena.pickups),
            map: arena.map,
        }
    }

    /// Emits the final snapshot and the ranking, then halts.
    fn finish(&mut self) -> Vec<Output> {
        self.ended = true;
        let snapshot = self.snapshot();
        let result = MatchResult {
            ranking: rank(self.arena.players()),
        };

        match result.winner() {
            Some(winner) => info!(tick = self.arena.tick, winner = %winner.name, player = %winner.player_id, "match ended"),
            None => info!(tick = self.arena.tick, "match ended with no players"),
        }

        vec![Output::Snapshot(snapshot), Output::End(result)]
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
