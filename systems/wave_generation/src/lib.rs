#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave planning system.
//!
//! [`WavePlanner::generate_wave`] maps a wave number and a [`TierTable`] to a
//! [`WaveSpawnPlan`] without any randomness: the mob total grows with the wave,
//! tiers share it by weight, milestone waves reshape the mix and the result is
//! cut into timed batches that respect the wave's concurrency cap.

use std::collections::BTreeMap;

use harpoon_core::{
    MobSpawnGroup, PlanError, SpawnBatch, TierDefinition, TierId, TierTable, WaveSpawnPlan,
    WaveTuning,
};
use sha2::{Digest, Sha256};
use tracing::debug;

const MIN_MOBS_PER_WAVE: u32 = 5;
const CONCURRENT_GROWTH_PER_WAVE: f64 = 0.25;
const WEIGHT_GROWTH_PER_WAVE: f64 = 0.2;
const SHARE_CAP_FACTOR: u32 = 3;

const MILESTONE_INTERVAL: u32 = 5;
const MILESTONE_TIERS: std::ops::RangeInclusive<u32> = 4..=6;
const LATE_GAME_WAVE: u32 = 15;
const LATE_GAME_TIERS: std::ops::RangeInclusive<u32> = 1..=2;

const MAX_BATCHES: u32 = 8;
const BASE_WAVE_SECONDS: f64 = 10.0;
const SECONDS_PER_WAVE: f64 = 4.0;

const CHALLENGE_START_WAVE: u32 = 16;
const CHALLENGE_MOB_LIMIT: u32 = 8;
const CHALLENGE_OFFSET_FRACTION: f64 = 0.8;
const CHALLENGE_TIER_COUNT: usize = 2;

/// Pure system that turns wave numbers into [`WaveSpawnPlan`] values.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavePlanner {
    tuning: WaveTuning,
}

impl WavePlanner {
    /// Creates a planner using the supplied tuning.
    pub fn new(tuning: WaveTuning) -> Result<Self, PlanError> {
        tuning.validate()?;
        Ok(Self { tuning })
    }

    /// Tuning the planner was built with.
    #[must_use]
    pub const fn tuning(&self) -> WaveTuning {
        self.tuning
    }

    /// Plans a single wave.
    ///
    /// Fails with [`PlanError::OutOfRange`] when `wave` lies outside
    /// `1..=max_waves`; no partial plan is produced in that case.
    pub fn generate_wave(&self, wave: u32, tiers: &TierTable) -> Result<WaveSpawnPlan, PlanError> {
        if wave == 0 || wave > self.tuning.max_waves {
            return Err(PlanError::OutOfRange {
                wave,
                max: self.tuning.max_waves,
            });
        }

        let total = total_mob_count(wave);
        let cap = max_concurrent(wave, &self.tuning);
        let fallback = fallback_tier(tiers);

        let mut distribution = tier_counts(wave, tiers, fallback);
        let target = total.max(planned_floor(wave, tiers, fallback));
        let assigned = distribution_sum(&distribution);
        if assigned < target {
            top_up(&mut distribution, target - assigned, fallback);
        }

        let batches = schedule(wave, cap, &distribution, tiers);
        let plan = WaveSpawnPlan::new(wave, cap, distribution, batches);
        debug!(
            wave,
            total,
            planned = plan.total_mobs(),
            max_concurrent = cap,
            batches = plan.batches().len(),
            "planned wave"
        );
        Ok(plan)
    }
}

/// Validates `definitions` and plans `wave` with the default tuning.
pub fn generate_wave(
    wave: u32,
    definitions: &[TierDefinition],
) -> Result<WaveSpawnPlan, PlanError> {
    let table = TierTable::new(definitions.to_vec())?;
    WavePlanner::default().generate_wave(wave, &table)
}

/// Nominal number of mobs in a wave before tier distribution.
#[must_use]
pub fn total_mob_count(wave: u32) -> u32 {
    let wave_f = f64::from(wave);
    let total = (wave_f.powf(1.5).floor() as u32)
        .saturating_add(MIN_MOBS_PER_WAVE)
        .saturating_add((wave_f * 1.2).floor() as u32);
    total.max(wave.saturating_mul(2))
}

/// Concurrency cap of a wave, clamped to the tuning's bounds.
#[must_use]
pub fn max_concurrent(wave: u32, tuning: &WaveTuning) -> u32 {
    let base = tuning.base_concurrent;
    let elapsed = wave.saturating_sub(1);
    let growth = 1.0 + CONCURRENT_GROWTH_PER_WAVE * f64::from(elapsed);
    let linear = base.saturating_add(elapsed);
    let scaled = (f64::from(base) * growth).floor() as u32;
    linear.max(scaled).max(base).min(tuning.concurrent_ceiling)
}

/// Relative share of `definition` in `wave`; zero while the tier is locked.
#[must_use]
pub fn tier_weight(definition: &TierDefinition, wave: u32) -> f64 {
    if !definition.is_unlocked(wave) {
        return 0.0;
    }
    let unlocked_for = f64::from(wave - definition.min_wave_to_appear() + 1);
    definition.base_weight()
        * (1.0 + WEIGHT_GROWTH_PER_WAVE * unlocked_for)
        * definition.growth_multiplier()
}

/// Length of a wave in seconds.
#[must_use]
pub fn wave_duration_seconds(wave: u32) -> f64 {
    BASE_WAVE_SECONDS + SECONDS_PER_WAVE * f64::from(wave)
}

/// Number of regular batch slots a wave is split into.
#[must_use]
pub fn batch_slot_count(wave: u32) -> u32 {
    (2 + wave / 3).min(MAX_BATCHES)
}

/// Stable SHA-256 digest of a plan's canonical little-endian encoding.
#[must_use]
pub fn plan_fingerprint(plan: &WaveSpawnPlan) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(plan.wave_number().to_le_bytes());
    hasher.update(plan.max_concurrent().to_le_bytes());

    hasher.update((plan.tier_distribution().len() as u64).to_le_bytes());
    for (tier, count) in plan.tier_distribution() {
        hasher.update(tier.get().to_le_bytes());
        hasher.update(count.to_le_bytes());
    }

    hasher.update((plan.batches().len() as u64).to_le_bytes());
    for batch in plan.batches() {
        hasher.update(batch.delay_seconds().to_le_bytes());
        hasher.update((batch.mobs().len() as u64).to_le_bytes());
        for group in batch.mobs() {
            hasher.update(group.tier().get().to_le_bytes());
            hasher.update(group.count().to_le_bytes());
        }
    }

    let digest = hasher.finalize();
    let mut fingerprint = [0u8; 32];
    fingerprint.copy_from_slice(&digest);
    fingerprint
}

/// Lowercase hexadecimal rendering of a [`plan_fingerprint`] digest.
#[must_use]
pub fn fingerprint_hex(fingerprint: &[u8; 32]) -> String {
    fingerprint.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn fallback_tier(tiers: &TierTable) -> TierId {
    let preferred = TierId::new(1);
    if tiers.get(preferred).is_some() {
        return preferred;
    }
    tiers
        .iter()
        .map(TierDefinition::tier)
        .next()
        .unwrap_or(preferred)
}

/// Milestone-adjusted tier counts before the non-decreasing floor is applied.
fn tier_counts(wave: u32, tiers: &TierTable, fallback: TierId) -> BTreeMap<TierId, u32> {
    let mut distribution = distribute(wave, total_mob_count(wave), tiers, fallback);
    apply_milestones(wave, &mut distribution);
    distribution
}

/// Largest planned total of any earlier wave.
///
/// Milestone boosts can lift a wave above the next wave's nominal total, so
/// every wave is topped up to at least the total planned before it.
fn planned_floor(wave: u32, tiers: &TierTable, fallback: TierId) -> u32 {
    (1..wave).fold(0, |floor, earlier| {
        distribution_sum(&tier_counts(earlier, tiers, fallback))
            .max(total_mob_count(earlier))
            .max(floor)
    })
}

fn distribution_sum(distribution: &BTreeMap<TierId, u32>) -> u32 {
    distribution
        .values()
        .fold(0u32, |sum, count| sum.saturating_add(*count))
}

fn distribute(
    wave: u32,
    total: u32,
    tiers: &TierTable,
    fallback: TierId,
) -> BTreeMap<TierId, u32> {
    let mut distribution: BTreeMap<TierId, u32> =
        tiers.iter().map(|definition| (definition.tier(), 0)).collect();

    let weights: Vec<f64> = tiers
        .iter()
        .map(|definition| tier_weight(definition, wave))
        .collect();
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 {
        *distribution.entry(fallback).or_insert(0) = total;
        return distribution;
    }

    let mut assigned = 0u32;
    for (definition, &weight) in tiers.iter().zip(&weights) {
        let mut share = (f64::from(total) * weight / weight_sum).floor() as u32;
        if weight > 0.0 && share == 0 {
            share = 1;
        }
        share = share.min(definition.max_concurrent().saturating_mul(SHARE_CAP_FACTOR));
        *distribution.entry(definition.tier()).or_insert(0) = share;
        assigned = assigned.saturating_add(share);
    }

    if total > assigned {
        top_up(&mut distribution, total - assigned, fallback);
    }
    distribution
}

fn apply_milestones(wave: u32, distribution: &mut BTreeMap<TierId, u32>) {
    if wave % MILESTONE_INTERVAL == 0 {
        for (tier, count) in distribution.iter_mut() {
            if MILESTONE_TIERS.contains(&tier.get()) {
                *count = count.saturating_mul(3) / 2;
            }
        }
    }

    if wave >= LATE_GAME_WAVE {
        for (tier, count) in distribution.iter_mut() {
            if LATE_GAME_TIERS.contains(&tier.get()) && *count > 0 {
                *count = (*count / 2).max(1);
            }
        }
    }
}

/// Adds `amount` to the highest tier holding mobs, or to `fallback` if none do.
fn top_up(distribution: &mut BTreeMap<TierId, u32>, amount: u32, fallback: TierId) {
    let target = distribution
        .iter()
        .rev()
        .find(|(_, count)| **count > 0)
        .map_or(fallback, |(tier, _)| *tier);
    let slot = distribution.entry(target).or_insert(0);
    *slot = slot.saturating_add(amount);
}

fn schedule(
    wave: u32,
    cap: u32,
    distribution: &BTreeMap<TierId, u32>,
    tiers: &TierTable,
) -> Vec<SpawnBatch> {
    let mut pool = distribution.clone();
    let challenge = if wave >= CHALLENGE_START_WAVE {
        withdraw_challenge(&mut pool, cap, tiers)
    } else {
        Vec::new()
    };

    let slot_count = batch_slot_count(wave);
    let duration = wave_duration_seconds(wave);
    let interval = duration / f64::from(slot_count);

    let mut slots: Vec<Vec<MobSpawnGroup>> = vec![Vec::new(); slot_count as usize];
    let slot_total = slots.len();
    let mut next_slot = 0usize;
    for definition in tiers.iter() {
        let mut remaining = pool.get(&definition.tier()).copied().unwrap_or(0);
        while remaining > 0 {
            let size = remaining.min(definition.max_concurrent());
            remaining -= size;
            slots[next_slot % slot_total].push(MobSpawnGroup::new(definition.tier(), size));
            next_slot += 1;
        }
    }

    let mut batches = Vec::with_capacity(slots.len() + 1);
    for (index, groups) in slots.into_iter().enumerate() {
        let delay = index as f64 * interval;
        let (admitted, overflow) = admit(groups, cap);
        batches.push(SpawnBatch::new(delay, admitted));

        let follow_ups = pack_overflow(overflow, cap);
        let follow_up_count = follow_ups.len();
        for (position, mobs) in follow_ups.into_iter().enumerate() {
            let offset = interval * (position + 1) as f64 / (follow_up_count + 1) as f64;
            batches.push(SpawnBatch::new(delay + offset, mobs));
        }
    }

    if !challenge.is_empty() {
        batches.push(SpawnBatch::new(
            duration * CHALLENGE_OFFSET_FRACTION,
            challenge,
        ));
    }

    batches.sort_by(|a, b| a.delay_seconds().total_cmp(&b.delay_seconds()));
    batches
}

/// Removes the challenge batch's mobs from the two highest populated tiers.
fn withdraw_challenge(
    pool: &mut BTreeMap<TierId, u32>,
    cap: u32,
    tiers: &TierTable,
) -> Vec<MobSpawnGroup> {
    let mut budget = (cap / 2).min(CHALLENGE_MOB_LIMIT);
    let highest: Vec<TierId> = pool
        .iter()
        .rev()
        .filter(|(_, count)| **count > 0)
        .map(|(tier, _)| *tier)
        .take(CHALLENGE_TIER_COUNT)
        .collect();

    let mut groups = Vec::new();
    for tier in highest {
        if budget == 0 {
            break;
        }
        let Some(count) = pool.get_mut(&tier) else {
            continue;
        };
        let group_limit = tiers
            .get(tier)
            .map_or(budget, TierDefinition::max_concurrent);
        let mut taken = (*count).min(budget);
        *count -= taken;
        budget -= taken;
        while taken > 0 {
            let size = taken.min(group_limit);
            groups.push(MobSpawnGroup::new(tier, size));
            taken -= size;
        }
    }
    groups
}

/// Splits `groups` into the part that fits the batch budget and the overflow.
fn admit(groups: Vec<MobSpawnGroup>, cap: u32) -> (Vec<MobSpawnGroup>, Vec<MobSpawnGroup>) {
    let mut budget = cap;
    let mut admitted = Vec::with_capacity(groups.len());
    let mut overflow = Vec::new();
    for group in groups {
        if group.count() <= budget {
            budget -= group.count();
            admitted.push(group);
            continue;
        }
        if budget > 0 {
            admitted.push(MobSpawnGroup::new(group.tier(), budget));
        }
        overflow.push(MobSpawnGroup::new(group.tier(), group.count() - budget));
        budget = 0;
    }
    (admitted, overflow)
}

fn pack_overflow(overflow: Vec<MobSpawnGroup>, cap: u32) -> Vec<Vec<MobSpawnGroup>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut budget = cap;
    for group in overflow {
        let mut remaining = group.count();
        while remaining > 0 {
            if budget == 0 {
                chunks.push(std::mem::take(&mut current));
                budget = cap;
            }
            let taken = remaining.min(budget);
            current.push(MobSpawnGroup::new(group.tier(), taken));
            remaining -= taken;
            budget -= taken;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
