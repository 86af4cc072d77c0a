use std::{env, fmt, str::FromStr};

use thiserror::Error;

pub const ENV_ARENA_SIZE: &str = "FFALLOC_ARENA_SIZE";
pub const ENV_POLICY: &str = "FFALLOC_POLICY";

/// Arena size used when nothing else is configured.
pub const DEFAULT_ARENA_SIZE: usize = 1024;

/// Placement strategies an arena can be asked for.
///
/// Only [`PlacementPolicy::FirstFit`] is implemented; the other variants exist so
/// callers get a proper [`UnsupportedPolicy`](crate::AllocError::UnsupportedPolicy)
/// instead of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementPolicy {
  #[default]
  FirstFit,
  BestFit,
  WorstFit,
  NextFit,
}

impl PlacementPolicy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::FirstFit => "first-fit",
      Self::BestFit => "best-fit",
      Self::WorstFit => "worst-fit",
      Self::NextFit => "next-fit",
    }
  }
}

impl fmt::Display for PlacementPolicy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PlacementPolicy {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
      "first-fit" | "firstfit" => Ok(Self::FirstFit),
      "best-fit" | "bestfit" => Ok(Self::BestFit),
      "worst-fit" | "worstfit" => Ok(Self::WorstFit),
      "next-fit" | "nextfit" => Ok(Self::NextFit),
      _ => Err(ConfigError::UnknownPolicy(s.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("unknown placement policy `{0}`")]
  UnknownPolicy(String),

  #[error("invalid arena size `{value}`: {reason}")]
  InvalidSize { value: String, reason: String },
}

/// Parameters for [`FirstFit::with_config`](crate::FirstFit::with_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub size: usize,
  pub policy: PlacementPolicy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      size: DEFAULT_ARENA_SIZE,
      policy: PlacementPolicy::FirstFit,
    }
  }
}

impl Config {
  pub fn new(
    size: usize,
    policy: PlacementPolicy,
  ) -> Self {
    Self { size, policy }
  }

  /// Reads `FFALLOC_ARENA_SIZE` and `FFALLOC_POLICY`, keeping defaults for unset
  /// variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();

    if let Some(value) = lookup(ENV_ARENA_SIZE) {
      config.size = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidSize {
          value: value.clone(),
          reason: e.to_string(),
        })?;
    }

    if let Some(value) = lookup(ENV_POLICY) {
      config.policy = value.parse()?;
    }

    Ok(config)
  }
}
