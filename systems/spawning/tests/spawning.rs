use std::collections::BTreeMap;
use std::time::Duration;

use harpoon_core::{
    MobSpawnGroup, SpawnBatch, SpawnPointId, SpawnRequest, TierDefinition, TierId, TierTable,
    WaveSpawnPlan,
};
use harpoon_system_spawning::{SpawnerConfig, TierVariants, WaveSpawner};
use harpoon_system_wave_generation::WavePlanner;

fn two_batch_plan() -> WaveSpawnPlan {
    let tier = TierId::new(1);
    WaveSpawnPlan::new(
        1,
        5,
        BTreeMap::from([(tier, 7)]),
        vec![
            SpawnBatch::new(0.0, vec![MobSpawnGroup::new(tier, 5)]),
            SpawnBatch::new(7.0, vec![MobSpawnGroup::new(tier, 2)]),
        ],
    )
}

fn spawn_points() -> Vec<SpawnPointId> {
    (0..3).map(SpawnPointId::new).collect()
}

fn campaign_tiers() -> TierTable {
    TierTable::new(vec![
        TierDefinition::new(TierId::new(1), 1, 6, 10.0, 1.0),
        TierDefinition::new(TierId::new(2), 2, 5, 7.0, 1.1),
        TierDefinition::new(TierId::new(3), 4, 4, 5.0, 1.2),
        TierDefinition::new(TierId::new(4), 7, 3, 3.0, 1.3),
        TierDefinition::new(TierId::new(5), 10, 2, 2.0, 1.4),
        TierDefinition::new(TierId::new(6), 14, 2, 1.0, 1.5),
    ])
    .expect("campaign tiers are valid")
}

fn config(seed: u64) -> SpawnerConfig {
    SpawnerConfig {
        seed,
        variants: vec![
            TierVariants {
                tier: TierId::new(1),
                count: 3,
            },
            TierVariants {
                tier: TierId::new(4),
                count: 2,
            },
        ],
    }
}

fn run_wave(spawner: &mut WaveSpawner, plan: &WaveSpawnPlan) -> Vec<SpawnRequest> {
    let points = spawn_points();
    let mut requests = Vec::new();
    spawner.begin_wave(plan);
    while !spawner.is_wave_complete() {
        spawner.handle(Duration::from_millis(250), &points, &mut requests);
    }
    requests
}

#[test]
fn releases_batches_when_their_delay_elapses() {
    let mut spawner = WaveSpawner::new(config(7)).expect("valid config");
    let points = spawn_points();
    let mut requests = Vec::new();

    spawner.begin_wave(&two_batch_plan());
    spawner.handle(Duration::ZERO, &points, &mut requests);
    assert_eq!(requests.len(), 5, "first batch is due immediately");

    spawner.handle(Duration::from_secs(6), &points, &mut requests);
    assert_eq!(requests.len(), 5, "second batch waits for seven seconds");
    assert!(!spawner.is_wave_complete());

    spawner.handle(Duration::from_secs(1), &points, &mut requests);
    assert_eq!(requests.len(), 7);
    assert!(spawner.is_wave_complete());
    assert_eq!(spawner.released_batches(), 2);

    for request in &requests {
        assert_eq!(request.wave, 1);
        assert_eq!(request.tier, TierId::new(1));
        assert!(request.variant < 3);
        assert!(points.contains(&request.spawn_point));
    }
}

#[test]
fn missing_spawn_points_hold_batches_back() {
    let mut spawner = WaveSpawner::new(config(7)).expect("valid config");
    let mut requests = Vec::new();

    spawner.begin_wave(&two_batch_plan());
    spawner.handle(Duration::from_secs(10), &[], &mut requests);
    assert!(requests.is_empty());
    assert_eq!(spawner.pending_batches(), 2);
    assert!((spawner.elapsed_seconds() - 10.0).abs() < f64::EPSILON);

    spawner.handle(Duration::ZERO, &spawn_points(), &mut requests);
    assert_eq!(requests.len(), 7, "overdue batches are released together");
}

#[test]
fn every_planned_mob_is_requested() {
    let planner = WavePlanner::default();
    let tiers = campaign_tiers();
    let mut spawner = WaveSpawner::new(config(42)).expect("valid config");

    for wave in [1, 7, 15, 16, 20] {
        let plan = planner.generate_wave(wave, &tiers).expect("wave in range");
        let requests = run_wave(&mut spawner, &plan);

        let mut per_tier: BTreeMap<TierId, u32> = BTreeMap::new();
        for request in &requests {
            assert_eq!(request.wave, wave);
            *per_tier.entry(request.tier).or_default() += 1;
        }
        let planned: BTreeMap<TierId, u32> = plan
            .tier_distribution()
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(tier, count)| (*tier, *count))
            .collect();
        assert_eq!(per_tier, planned, "wave {wave} spawns its distribution");
    }
}

#[test]
fn same_seed_replays_identically() {
    let plan = WavePlanner::default()
        .generate_wave(12, &campaign_tiers())
        .expect("wave in range");

    let mut first = WaveSpawner::new(config(0x5eed)).expect("valid config");
    let mut second = WaveSpawner::new(config(0x5eed)).expect("valid config");
    assert_eq!(run_wave(&mut first, &plan), run_wave(&mut second, &plan));
}

#[test]
fn beginning_a_wave_discards_leftovers() {
    let mut spawner = WaveSpawner::new(config(3)).expect("valid config");
    let points = spawn_points();
    let mut requests = Vec::new();

    spawner.begin_wave(&two_batch_plan());
    spawner.handle(Duration::ZERO, &points, &mut requests);
    assert_eq!(spawner.pending_batches(), 1);

    let next = WaveSpawnPlan::new(2, 5, BTreeMap::new(), Vec::new());
    spawner.begin_wave(&next);
    assert_eq!(spawner.wave(), 2);
    assert!(spawner.is_wave_complete());
    assert_eq!(spawner.released_batches(), 0);
}
