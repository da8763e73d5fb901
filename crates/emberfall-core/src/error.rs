//! Error types for the Emberfall engine.
//!
//! A running step never fails. Errors only surface at the edges: rejecting a
//! tuning table before a match is built, and starting the driver outside a
//! tokio runtime.

use thiserror::Error;

/// A [`Tuning`](crate::config::Tuning) value that cannot drive a match.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Tick rate of zero would make the step interval infinite.
    #[error("tick rate must be at least 1 tick per second")]
    ZeroTickRate,

    /// A periodic schedule with a zero period.
    #[error("`{field}` must be at least one tick")]
    ZeroInterval {
        /// Name of the offending field
        field: &'static str,
    },

    /// A length, speed or damage value that must be strictly positive.
    #[error("`{field}` must be positive and finite, got {value}")]
    NonPositive {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f32,
    },

    /// A lower bound that exceeds its upper bound.
    #[error("`{field}` range is inverted: {min} > {max}")]
    InvertedRange {
        /// Name of the offending range
        field: &'static str,
        /// Lower bound as configured
        min: f32,
        /// Upper bound as configured
        max: f32,
    },
}

/// Failure to start a [`MatchDriver`](crate::driver::MatchDriver).
#[derive(Debug, Error)]
pub enum DriverError {
    /// `start` was called from a thread with no tokio runtime.
    #[error("match driver must be started from inside a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
