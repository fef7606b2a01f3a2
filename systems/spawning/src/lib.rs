#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawner that turns a wave plan into timed spawn requests.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use harpoon_core::{SpawnBatch, SpawnPointId, SpawnRequest, TierId, WaveSpawnPlan};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Number of prefab variants available for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierVariants {
    /// Tier the variants belong to.
    pub tier: TierId,
    /// Number of variants, at least one.
    pub count: u32,
}

/// Configuration parameters required to construct the spawner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Seed of the variant and spawn point choices.
    pub seed: u64,
    /// Variant counts per tier. Unlisted tiers have a single variant.
    #[serde(default)]
    pub variants: Vec<TierVariants>,
}

/// Reasons a spawner configuration may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpawnerError {
    /// A tier was given zero variants.
    #[error("{0} must have at least one variant")]
    NoVariants(TierId),
    /// A tier was listed twice.
    #[error("variants of {0} are listed more than once")]
    DuplicateTier(TierId),
}

/// Pure system releasing the batches of the current wave as their delay elapses.
#[derive(Debug)]
pub struct WaveSpawner {
    rng: ChaCha8Rng,
    variants: BTreeMap<TierId, u32>,
    wave: u32,
    elapsed: f64,
    pending: VecDeque<SpawnBatch>,
    released: usize,
}

impl WaveSpawner {
    /// Creates a spawner with no active wave.
    pub fn new(config: SpawnerConfig) -> Result<Self, SpawnerError> {
        let mut variants = BTreeMap::new();
        for entry in config.variants {
            if entry.count == 0 {
                return Err(SpawnerError::NoVariants(entry.tier));
            }
            if variants.insert(entry.tier, entry.count).is_some() {
                return Err(SpawnerError::DuplicateTier(entry.tier));
            }
        }

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            variants,
            wave: 0,
            elapsed: 0.0,
            pending: VecDeque::new(),
            released: 0,
        })
    }

    /// Loads `plan` and restarts the wave clock. Unreleased batches of the
    /// previous wave are discarded.
    pub fn begin_wave(&mut self, plan: &WaveSpawnPlan) {
        self.wave = plan.wave_number();
        self.elapsed = 0.0;
        self.released = 0;
        self.pending = plan.batches().iter().cloned().collect();
        debug!(
            wave = self.wave,
            batches = self.pending.len(),
            mobs = plan.scheduled_mobs(),
            "wave started"
        );
    }

    /// Advances the wave clock by `dt` and emits one request per mob of every
    /// batch that became due.
    ///
    /// Without spawn points nothing is released; due batches wait for the next
    /// call that supplies some.
    pub fn handle(&mut self, dt: Duration, spawn_points: &[SpawnPointId], out: &mut Vec<SpawnRequest>) {
        self.elapsed += dt.as_secs_f64();
        if spawn_points.is_empty() {
            return;
        }

        while self
            .pending
            .front()
            .is_some_and(|batch| batch.delay_seconds() <= self.elapsed)
        {
            let Some(batch) = self.pending.pop_front() else {
                break;
            };
            self.release(&batch, spawn_points, out);
        }
    }

    /// Wave currently being spawned, zero before the first wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Seconds since the current wave began.
    #[must_use]
    pub const fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Number of batches still waiting for their delay.
    #[must_use]
    pub fn pending_batches(&self) -> usize {
        self.pending.len()
    }

    /// Number of batches released in the current wave.
    #[must_use]
    pub const fn released_batches(&self) -> usize {
        self.released
    }

    /// Reports whether every batch of the current wave has been released.
    #[must_use]
    pub fn is_wave_complete(&self) -> bool {
        self.pending.is_empty()
    }

    fn release(&mut self, batch: &SpawnBatch, spawn_points: &[SpawnPointId], out: &mut Vec<SpawnRequest>) {
        debug!(
            wave = self.wave,
            delay = batch.delay_seconds(),
            mobs = batch.mob_count(),
            "releasing batch"
        );
        for group in batch.mobs() {
            let tier = group.tier();
            for _ in 0..group.count() {
                let variant = self.select_variant(tier);
                let spawn_point = self.select_spawn_point(spawn_points);
                out.push(SpawnRequest {
                    wave: self.wave,
                    tier,
                    variant,
                    spawn_point,
                });
            }
        }
        self.released += 1;
    }

    fn select_variant(&mut self, tier: TierId) -> u32 {
        let count = self.variants.get(&tier).copied().unwrap_or(1);
        if count == 1 {
            0
        } else {
            self.rng.gen_range(0..count)
        }
    }

    fn select_spawn_point(&mut self, spawn_points: &[SpawnPointId]) -> SpawnPointId {
        debug_assert!(!spawn_points.is_empty(), "select_spawn_point requires spawn points");
        let index = self.rng.gen_range(0..spawn_points.len());
        spawn_points[index]
    }
}
