use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use harpoon_core::{TierDefinition, TierTable, WaveTuning};
use harpoon_system_spawning::SpawnerConfig;
use harpoon_system_wave_generation::WavePlanner;
use serde::Deserialize;

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Campaign shipped with the binary, used when no `--config` is given.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Validated campaign configuration.
#[derive(Clone, Debug)]
pub(crate) struct Campaign {
    pub(crate) planner: WavePlanner,
    pub(crate) tiers: TierTable,
    pub(crate) spawning: SpawnerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    version: u32,
    #[serde(default)]
    tuning: WaveTuning,
    tiers: Vec<TierDefinition>,
    #[serde(default)]
    spawning: SpawnerConfig,
}

/// Loads the campaign at `path`, or the embedded default when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<Campaign> {
    let Some(path) = path else {
        return parse(DEFAULT_CONFIG).context("embedded default campaign is invalid");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read campaign config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid campaign config {}", path.display()))
}

fn parse(contents: &str) -> Result<Campaign> {
    let document: Document =
        toml::from_str(contents).context("failed to parse campaign toml contents")?;
    if document.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported campaign config version {}; expected {}",
            document.version,
            SUPPORTED_CONFIG_VERSION
        );
    }

    let planner = WavePlanner::new(document.tuning).context("invalid [tuning] section")?;
    let tiers = TierTable::new(document.tiers).context("invalid [[tiers]] entries")?;
    for entry in &document.spawning.variants {
        if tiers.get(entry.tier).is_none() {
            bail!("[spawning] lists variants for undefined {}", entry.tier);
        }
    }

    Ok(Campaign {
        planner,
        tiers,
        spawning: document.spawning,
    })
}
