//! Real-time match driver.
//!
//! [`MatchDriver`] steps a [`Simulation`] on a tokio interval at the tuning's
//! tick rate and fans every [`Output`] out on a broadcast channel. The match
//! phase is published on a watch channel.
//!
//! The simulation sits behind one mutex shared by the ticking task and
//! [`MatchDriver::remove_player`], so a disconnect is applied either entirely
//! before or entirely after a step. Outputs are published while that lock is
//! held, so subscribers see them in simulation order and nothing follows the
//! end output.
//!
//! # Example
//!
//! ```
//! use emberfall_core::driver::{MatchDriver, MatchPhase};
//! use emberfall_core::entity::{ClassKind, ConnectionId, RosterEntry};
//! use emberfall_core::simulation::Simulation;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let roster = vec![
//!     RosterEntry::new("a", 1, "Ash", ClassKind::Barbarian),
//!     RosterEntry::new("b", 2, "Bryn", ClassKind::Paladin),
//! ];
//! let driver = MatchDriver::new(Simulation::new(&roster, 7));
//! let mut outputs = driver.subscribe();
//!
//! driver.start().unwrap();
//! driver.remove_player(&ConnectionId::from("b"));
//!
//! assert_eq!(*driver.phase().borrow(), MatchPhase::Ended);
//! while let Ok(output) = outputs.recv().await {
//!     if output.as_end().is_some() {
//!         break;
//!     }
//! }
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::entity::ConnectionId;
use crate::error::DriverError;
use crate::output::Output;
use crate::simulation::Simulation;

/// Outputs buffered per subscriber before slow receivers start lagging.
const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle of a driven match.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchPhase {
    /// Not ticking: never started, or stopped.
    Waiting,
    /// Ticking on the interval.
    Running,
    /// The end output has been published. Terminal.
    Ended,
}

/// Runs one match in real time.
#[derive(Debug)]
pub struct MatchDriver {
    sim: Arc<Mutex<Simulation>>,
    outputs: broadcast::Sender<Output>,
    phase: Arc<watch::Sender<MatchPhase>>,
    shutdown: Mutex<Option<Arc<Notify>>>,
}

impl MatchDriver {
    /// Wraps a simulation. Nothing ticks until [`start`](Self::start).
    #[must_use]
    pub fn new(sim: Simulation) -> Self {
        let initial = if sim.is_ended() {
            MatchPhase::Ended
        } else {
            MatchPhase::Waiting
        };
        let (outputs, _) = broadcast::channel(OUTPUT_CHANNEL_CAPACITY);
        let (phase, _) = watch::channel(initial);
        Self {
            sim: Arc::new(Mutex::new(sim)),
            outputs,
            phase: Arc::new(phase),
            shutdown: Mutex::new(None),
        }
    }

    /// Receives every output published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Output> {
        self.outputs.subscribe()
    }

    /// Watches the match phase.
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<MatchPhase> {
        self.phase.subscribe()
    }

    /// Runs `f` against the simulation under the lock.
    pub fn with_simulation<R>(&self, f: impl FnOnce(&Simulation) -> R) -> R {
        f(&lock(&self.sim))
    }

    /// Starts ticking on the current tokio runtime. Does nothing while already
    /// running or once the match has ended.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoRuntime`] when called outside a tokio runtime.
    pub fn start(&self) -> Result<(), DriverError> {
        let handle = Handle::try_current()?;

        let started = self.phase.send_if_modified(|phase| {
            if *phase == MatchPhase::Waiting {
                *phase = MatchPhase::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Ok(());
        }

        let shutdown = Arc::new(Notify::new());
        *lock(&self.shutdown) = Some(Arc::clone(&shutdown));

        let period = lock(&self.sim).arena().tuning().tick_interval();
        info!(period_ms = period.as_millis(), "match driver started");
        handle.spawn(run(
            Arc::clone(&self.sim),
            self.outputs.clone(),
            Arc::clone(&self.phase),
            shutdown,
            period,
        ));
        Ok(())
    }

    /// Stops ticking after the current step, if any. Idempotent.
    pub fn stop(&self) {
        let stopped = self.phase.send_if_modified(|phase| {
            if *phase == MatchPhase::Running {
                *phase = MatchPhase::Waiting;
                true
            } else {
                false
            }
        });
        if let Some(shutdown) = lock(&self.shutdown).take() {
            shutdown.notify_one();
        }
        if stopped {
            info!("match driver stopped");
        }
    }

    /// Removes a disconnected player between steps and publishes any outputs
    /// this produces (the final snapshot and ranking, if it ends the match).
    pub fn remove_player(&self, connection: &ConnectionId) {
        let mut sim = lock(&self.sim);
        let outputs = sim.remove_player(connection);
        publish(&self.outputs, outputs);
        if sim.is_ended() {
            self.phase.send_replace(MatchPhase::Ended);
        }
    }
}

impl Drop for MatchDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(tx: &broadcast::Sender<Output>, outputs: Vec<Output>) {
    for output in outputs {
        // No subscribers is fine.
        let _ = tx.send(output);
    }
}

async fn run(
    sim: Arc<Mutex<Simulation>>,
    outputs: broadcast::Sender<Output>,
    phase: Arc<watch::Sender<MatchPhase>>,
    shutdown: Arc<Notify>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = shutdown.notified() => {
                debug!("match loop shut down");
                break;
            }
            _ = interval.tick() => {
                let ended = {
                    let mut sim = lock(&sim);
                    if !sim.is_ended() {
                        publish(&outputs, sim.step());
                    }
                    sim.is_ended()
                };
                if ended {
                    phase.send_replace(MatchPhase::Ended);
                    debug!("match loop finished");
                    break;
                }
            }
        }
    }
}
