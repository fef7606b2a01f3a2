use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use harpoon_core::{SpawnPointId, StateChanged, WaveSpawnPlan};
use harpoon_event_bus::EventRegistry;
use harpoon_system_game_state::GameStateMachine;
use harpoon_system_spawning::WaveSpawner;
use harpoon_system_wave_generation::{fingerprint_hex, plan_fingerprint};
use tracing::info;

use crate::config::Campaign;

/// Spawn points offered to the spawner during a headless session.
const SESSION_SPAWN_POINTS: u32 = 4;

/// Prints a single plan as a text table or JSON document.
pub(crate) fn plan(campaign: &Campaign, wave: u32, json: bool, out: &mut impl Write) -> Result<()> {
    let plan = campaign
        .planner
        .generate_wave(wave, &campaign.tiers)
        .with_context(|| format!("failed to plan wave {wave}"))?;
    let fingerprint = fingerprint_hex(&plan_fingerprint(&plan));

    if json {
        let document = serde_json::json!({
            "plan": plan,
            "fingerprint": fingerprint,
        });
        serde_json::to_writer_pretty(&mut *out, &document).context("failed to encode plan")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "wave {}: {} mobs, max concurrent {}, {} batches",
        plan.wave_number(),
        plan.total_mobs(),
        plan.max_concurrent(),
        plan.batches().len()
    )?;
    for (tier, count) in plan.tier_distribution() {
        writeln!(out, "  {tier}: {count}")?;
    }
    for batch in plan.batches() {
        let groups = batch
            .mobs()
            .iter()
            .map(|group| format!("{} x{}", group.tier(), group.count()))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "  +{:>7.2}s  {groups}", batch.delay_seconds())?;
    }
    writeln!(out, "fingerprint {fingerprint}")?;
    Ok(())
}

/// Prints one summary row per plannable wave.
pub(crate) fn table(campaign: &Campaign, out: &mut impl Write) -> Result<()> {
    writeln!(out, "wave  total  cap  batches  distribution")?;
    for wave in 1..=campaign.planner.tuning().max_waves {
        let plan = campaign
            .planner
            .generate_wave(wave, &campaign.tiers)
            .with_context(|| format!("failed to plan wave {wave}"))?;
        writeln!(
            out,
            "{:>4}  {:>5}  {:>3}  {:>7}  {}",
            wave,
            plan.total_mobs(),
            plan.max_concurrent(),
            plan.batches().len(),
            distribution_summary(&plan)
        )?;
    }
    Ok(())
}

/// Runs `waves` waves headlessly through the state machine and the spawner.
pub(crate) fn session(
    campaign: &Campaign,
    waves: u32,
    step: Duration,
    out: &mut impl Write,
) -> Result<()> {
    if step.is_zero() {
        bail!("session step must be positive");
    }

    let registry = EventRegistry::new();
    let machine = GameStateMachine::new(&registry).context("failed to create state machine")?;
    let transitions = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&transitions);
    let _observer = machine
        .state_changed()
        .subscribe("session", move |change: &StateChanged| {
            let _ = observed.fetch_add(1, Ordering::Relaxed);
            info!(from = %change.previous, to = %change.current, "session observed state change");
        });

    let mut spawner =
        WaveSpawner::new(campaign.spawning.clone()).context("invalid [spawning] section")?;
    let spawn_points: Vec<SpawnPointId> = (0..SESSION_SPAWN_POINTS).map(SpawnPointId::new).collect();
    let mut requests = Vec::new();

    if !machine.activate_level() {
        bail!("could not leave {}", machine.current());
    }

    for wave in 1..=waves {
        let plan = campaign
            .planner
            .generate_wave(wave, &campaign.tiers)
            .with_context(|| format!("failed to plan wave {wave}"))?;

        requests.clear();
        spawner.begin_wave(&plan);
        while !spawner.is_wave_complete() {
            spawner.handle(step, &spawn_points, &mut requests);
        }

        writeln!(
            out,
            "wave {wave}: spawned {} of {} mobs in {} batches over {:.1}s",
            requests.len(),
            plan.total_mobs(),
            spawner.released_batches(),
            spawner.elapsed_seconds()
        )?;

        if !machine.open_upgrade_menu() || !machine.finish_upgrades() {
            bail!("upgrade menu transition failed after wave {wave}");
        }
    }

    if !machine.pause_game() || !machine.activate_title_screen() {
        bail!("could not return to the title screen");
    }
    writeln!(
        out,
        "session finished on {} after {} state changes",
        machine.current(),
        transitions.load(Ordering::Relaxed)
    )?;
    Ok(())
}

fn distribution_summary(plan: &WaveSpawnPlan) -> String {
    plan.tier_distribution()
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(tier, count)| format!("{}:{count}", tier.get()))
        .collect::<Vec<_>>()
        .join(" ")
}
