//! Scenario suites that drive whole matches.
//!
//! - `helpers.rs`: arena and roster factories shared by every test module
//! - `integration.rs`: end-to-end match behavior through [`Simulation`](crate::simulation::Simulation)
//! - `determinism.rs`: same seed, same world

pub(crate) mod helpers;
mod integration;
