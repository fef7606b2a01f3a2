#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Harpoon gameplay layer.
//!
//! This crate defines the data that flows between the pure systems. The wave
//! generation system turns a validated [`TierTable`] into a [`WaveSpawnPlan`],
//! the spawning system releases that plan as [`SpawnRequest`] values, and the
//! game state machine publishes [`StateChanged`] notifications whenever the
//! current [`GameState`] moves. Nothing here performs I/O or owns mutable
//! global state.

mod plan;
mod state;
mod tier;

pub use plan::{MobSpawnGroup, SpawnBatch, SpawnRequest, SpawnPointId, WaveSpawnPlan};
pub use state::{GameState, StateChanged, StateError, StateEventKind};
pub use tier::{ConfigError, TierDefinition, TierId, TierTable, WaveTuning};

use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Harpoon.";

/// Default upper bound on the wave numbers the planner accepts.
pub const DEFAULT_MAX_WAVES: u32 = 20;

/// Concurrency cap of the very first wave.
pub const BASE_CONCURRENT: u32 = 5;

/// Hard ceiling applied to every wave's concurrency cap.
pub const CONCURRENT_CEILING: u32 = 50;

/// Largest `max_waves` a tuning may configure.
pub const WAVE_LIMIT: u32 = 1_000;

/// Reasons wave planning may refuse to produce a plan.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PlanError {
    /// The requested wave lies outside `1..=max`.
    #[error("wave {wave} is outside the supported range 1..={max}")]
    OutOfRange {
        /// Wave number supplied by the caller.
        wave: u32,
        /// Largest wave number the planner accepts.
        max: u32,
    },
    /// The tier configuration or tuning handed to the planner is invalid.
    #[error("invalid wave configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
