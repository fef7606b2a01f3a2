use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BASE_CONCURRENT, CONCURRENT_CEILING, DEFAULT_MAX_WAVES, WAVE_LIMIT};

/// Identifier of an enemy difficulty tier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TierId(u32);

impl TierId {
    /// Creates a new tier identifier with the provided numeric value.
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

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.0)
    }
}

/// Static configuration describing when and how strongly a tier appears.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    tier: TierId,
    min_wave_to_appear: u32,
    max_concurrent: u32,
    base_weight: f64,
    growth_multiplier: f64,
}

impl TierDefinition {
    /// Creates a new tier definition. Validation happens in [`TierTable::new`].
    #[must_use]
    pub const fn new(
        tier: TierId,
        min_wave_to_appear: u32,
        max_concurrent: u32,
        base_weight: f64,
        growth_multiplier: f64,
    ) -> Self {
        Self {
            tier,
            min_wave_to_appear,
            max_concurrent,
            base_weight,
            growth_multiplier,
        }
    }

    /// Identifier of the tier.
    #[must_use]
    pub const fn tier(&self) -> TierId {
        self.tier
    }

    /// First wave in which the tier may be spawned.
    #[must_use]
    pub const fn min_wave_to_appear(&self) -> u32 {
        self.min_wave_to_appear
    }

    /// Largest sub-group of this tier released at once.
    #[must_use]
    pub const fn max_concurrent(&self) -> u32 {
        self.max_concurrent
    }

    /// Unscaled share of the wave assigned to this tier.
    #[must_use]
    pub const fn base_weight(&self) -> f64 {
        self.base_weight
    }

    /// Multiplier applied on top of the per-wave weight growth.
    #[must_use]
    pub const fn growth_multiplier(&self) -> f64 {
        self.growth_multiplier
    }

    /// Reports whether the tier is unlocked for the provided wave.
    #[must_use]
    pub const fn is_unlocked(&self, wave: u32) -> bool {
        self.min_wave_to_appear <= wave
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tier.get() == 0 {
            return Err(ConfigError::ZeroTier);
        }
        if self.min_wave_to_appear == 0 {
            return Err(ConfigError::InvalidMinWave { tier: self.tier });
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroMaxConcurrent { tier: self.tier });
        }
        for (field, value) in [
            ("base_weight", self.base_weight),
            ("growth_multiplier", self.growth_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    tier: self.tier,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Validated, tier-ordered collection of [`TierDefinition`] values.
#[derive(Clone, Debug, PartialEq)]
pub struct TierTable {
    definitions: Vec<TierDefinition>,
}

impl TierTable {
    /// Validates the supplied definitions and orders them by tier id.
    pub fn new(mut definitions: Vec<TierDefinition>) -> Result<Self, ConfigError> {
        if definitions.is_empty() {
            return Err(ConfigError::EmptyTierTable);
        }
        for definition in &definitions {
            definition.validate()?;
        }

        definitions.sort_by_key(TierDefinition::tier);
        for pair in definitions.windows(2) {
            if pair[0].tier() == pair[1].tier() {
                return Err(ConfigError::DuplicateTier(pair[0].tier()));
            }
        }

        Ok(Self { definitions })
    }

    /// Definitions in ascending tier order.
    #[must_use]
    pub fn definitions(&self) -> &[TierDefinition] {
        &self.definitions
    }

    /// Iterator over the definitions in ascending tier order.
    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.definitions.iter()
    }

    /// Looks up the definition of a single tier.
    #[must_use]
    pub fn get(&self, tier: TierId) -> Option<&TierDefinition> {
        self.definitions
            .binary_search_by_key(&tier, TierDefinition::tier)
            .ok()
            .map(|index| &self.definitions[index])
    }

    /// Number of tiers in the table. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always `false`; an empty table is rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Global knobs of the wave planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Largest wave number that may be planned.
    pub max_waves: u32,
    /// Concurrency cap of wave one and the lower clamp for every later wave.
    pub base_concurrent: u32,
    /// Upper clamp of the per-wave concurrency cap.
    pub concurrent_ceiling: u32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            max_waves: DEFAULT_MAX_WAVES,
            base_concurrent: BASE_CONCURRENT,
            concurrent_ceiling: CONCURRENT_CEILING,
        }
    }
}

impl WaveTuning {
    /// Rejects tunings the planner cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_waves == 0 {
            return Err(ConfigError::ZeroMaxWaves);
        }
        if self.max_waves > WAVE_LIMIT {
            return Err(ConfigError::TooManyWaves {
                max_waves: self.max_waves,
                limit: WAVE_LIMIT,
            });
        }
        if self.base_concurrent == 0 || self.concurrent_ceiling < self.base_concurrent {
            return Err(ConfigError::InvalidConcurrency {
                base: self.base_concurrent,
                ceiling: self.concurrent_ceiling,
            });
        }
        Ok(())
    }
}

/// Reasons a tier table or tuning may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// No tier definitions were supplied.
    #[error("tier table is empty")]
    EmptyTierTable,
    /// A definition used the reserved tier id zero.
    #[error("tier ids must be positive")]
    ZeroTier,
    /// Two definitions share the same tier id.
    #[error("{0} is defined more than once")]
    DuplicateTier(TierId),
    /// A definition unlocks before wave one.
    #[error("{tier} must appear no earlier than wave 1")]
    InvalidMinWave {
        /// Offending tier.
        tier: TierId,
    },
    /// A definition allows zero concurrent mobs.
    #[error("{tier} must allow at least one concurrent mob")]
    ZeroMaxConcurrent {
        /// Offending tier.
        tier: TierId,
    },
    /// A weight field is negative or not finite.
    #[error("{tier} has invalid {field} {value}")]
    InvalidWeight {
        /// Offending tier.
        tier: TierId,
        /// Name of the rejected field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// The tuning allows no waves at all.
    #[error("max_waves must be at least 1")]
    ZeroMaxWaves,
    /// The tuning asks for more waves than the planner supports.
    #[error("max_waves {max_waves} exceeds the supported limit of {limit}")]
    TooManyWaves {
        /// Configured wave count.
        max_waves: u32,
        /// Largest accepted wave count.
        limit: u32,
    },
    /// The concurrency clamp is empty or starts at zero.
    #[error("concurrency clamp [{base}, {ceiling}] is invalid")]
    InvalidConcurrency {
        /// Configured lower clamp.
        base: u32,
        /// Configured upper clamp.
        ceiling: u32,
    },
}
