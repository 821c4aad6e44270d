//! Estimator configuration.
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! damage_policy = "max-over-count"
//! lookup_policy = "clamp"
//! ```
//!
//! Missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How per-round damage is derived from the damaging actions.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DamagePolicy {
    /// Every damaging action is used once per round; damage is summed.
    #[default]
    Sum,
    /// Only the strongest damaging action counts.
    Max,
    /// Mean expected damage across damaging actions.
    Mean,
    /// Strongest action's damage divided by the number of damaging actions.
    MaxOverCount,
}

/// What happens when no balancing row matches a queried value.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LookupPolicy {
    /// Fail with [`EstimateError::LookupMiss`](crate::EstimateError::LookupMiss).
    #[default]
    Error,
    /// Use the row closest to the queried value.
    Clamp,
}

/// Errors that can occur while loading an estimator configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`EstimatorConfig`].
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Tunable estimator behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Per-round damage aggregation.
    pub damage_policy: DamagePolicy,
    /// Behaviour on balancing-table misses.
    pub lookup_policy: LookupPolicy,
}

impl EstimatorConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is malformed or names an
    /// unknown key or policy.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded estimator config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Overrides the damage policy.
    #[must_use]
    pub const fn with_damage_policy(mut self, policy: DamagePolicy) -> Self {
        self.damage_policy = policy;
        self
    }

    /// Overrides the lookup policy.
    #[must_use]
    pub const fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.lookup_policy = policy;
        self
    }
}
