use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TierId;

/// A number of mobs of a single tier released together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MobSpawnGroup {
    tier: TierId,
    count: u32,
}

impl MobSpawnGroup {
    /// Creates a new group. `count` is expected to be positive.
    #[must_use]
    pub const fn new(tier: TierId, count: u32) -> Self {
        Self { tier, count }
    }

    /// Tier of every mob in the group.
    #[must_use]
    pub const fn tier(&self) -> TierId {
        self.tier
    }

    /// Number of mobs in the group.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

/// Timed collection of spawn groups within a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnBatch {
    delay_seconds: f64,
    mobs: Vec<MobSpawnGroup>,
}

impl SpawnBatch {
    /// Creates a batch released `delay_seconds` after the wave starts.
    #[must_use]
    pub fn new(delay_seconds: f64, mobs: Vec<MobSpawnGroup>) -> Self {
        Self {
            delay_seconds,
            mobs,
        }
    }

    /// Offset from the start of the wave, in seconds.
    #[must_use]
    pub const fn delay_seconds(&self) -> f64 {
        self.delay_seconds
    }

    /// Groups released by the batch, in planning order.
    #[must_use]
    pub fn mobs(&self) -> &[MobSpawnGroup] {
        &self.mobs
    }

    /// Total number of mobs released by the batch.
    #[must_use]
    pub fn mob_count(&self) -> u32 {
        self.mobs.iter().map(MobSpawnGroup::count).sum()
    }
}

/// Complete spawn plan for a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSpawnPlan {
    wave_number: u32,
    max_concurrent: u32,
    tier_distribution: BTreeMap<TierId, u32>,
    batches: Vec<SpawnBatch>,
}

impl WaveSpawnPlan {
    /// Assembles a plan from its already computed parts.
    #[must_use]
    pub fn new(
        wave_number: u32,
        max_concurrent: u32,
        tier_distribution: BTreeMap<TierId, u32>,
        batches: Vec<SpawnBatch>,
    ) -> Self {
        Self {
            wave_number,
            max_concurrent,
            tier_distribution,
            batches,
        }
    }

    /// Wave the plan was generated for.
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.wave_number
    }

    /// Concurrency cap of the wave.
    #[must_use]
    pub const fn max_concurrent(&self) -> u32 {
        self.max_concurrent
    }

    /// Mob count per tier. Every configured tier is present, possibly with zero.
    #[must_use]
    pub fn tier_distribution(&self) -> &BTreeMap<TierId, u32> {
        &self.tier_distribution
    }

    /// Batches in ascending delay order.
    #[must_use]
    pub fn batches(&self) -> &[SpawnBatch] {
        &self.batches
    }

    /// Sum of the tier distribution.
    #[must_use]
    pub fn total_mobs(&self) -> u32 {
        self.tier_distribution.values().sum()
    }

    /// Sum of every group across every batch.
    #[must_use]
    pub fn scheduled_mobs(&self) -> u32 {
        self.batches.iter().map(SpawnBatch::mob_count).sum()
    }
}

/// Index of a spawn location supplied by the host scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointId(u32);

impl SpawnPointId {
    /// Creates a new spawn point identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Request for the host to instantiate a single mob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnRequest {
    /// Wave the mob belongs to.
    pub wave: u32,
    /// Tier of the mob.
    pub tier: TierId,
    /// Prefab variant within the tier.
    pub variant: u32,
    /// Location the mob should appear at.
    pub spawn_point: SpawnPointId,
}
