//! Game and session configuration.
//!
//! Both configs deserialize from JSON with every field optional; missing
//! fields take the defaults of the mobile application.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::AttackRules;

/// Smallest supported grid side.
pub const MIN_GRID_SIDE: u16 = 4;
/// Largest supported grid side.
pub const MAX_GRID_SIDE: u16 = 64;
/// Default grid side.
pub const DEFAULT_GRID_SIDE: u16 = 10;
/// Default weapon line-length requirement.
pub const DEFAULT_WEAPON_REQ: usize = 4;

/// Parameters fixed for the lifetime of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Grid width in cells.
    pub width: u16,
    /// Grid height in cells.
    pub height: u16,
    /// Weapon requirement used when the log carries no `WEAPON_REQ`.
    pub weapon_req: usize,
    /// Attack target and sacrifice rules.
    pub rules: AttackRules,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_SIDE,
            height: DEFAULT_GRID_SIDE,
            weapon_req: DEFAULT_WEAPON_REQ,
            rules: AttackRules::default(),
        }
    }
}

impl GameConfig {
    /// Check the grid bounds and weapon requirement.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::GridSize`] for a side outside
    /// `MIN_GRID_SIDE..=MAX_GRID_SIDE` and [`ConfigError::ZeroWeaponReq`]
    /// for a zero requirement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let side = MIN_GRID_SIDE..=MAX_GRID_SIDE;
        if !side.contains(&self.width) || !side.contains(&self.height) {
            return Err(ConfigError::GridSize {
                width: self.width,
                height: self.height,
                min: MIN_GRID_SIDE,
                max: MAX_GRID_SIDE,
            });
        }
        if self.weapon_req == 0 {
            return Err(ConfigError::ZeroWeaponReq);
        }
        Ok(())
    }

    /// Load and validate a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = read_file(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Retry schedule for transport calls: `attempts` tries, waiting
/// `base_delay * 2^i` after failed try `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total tries, including the first.
    pub attempts: u32,
    /// Delay before the first retry.
    #[serde(with = "millis")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and never sleeps.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after failed try `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Parameters for a multiplayer session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Battle server base URL, without trailing slash.
    pub server_url: String,
    /// Interval between background log polls.
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Pause before an AI seat moves.
    #[serde(with = "millis")]
    pub ai_delay: Duration,
    /// Transport retry schedule.
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            poll_interval: Duration::from_secs(1),
            ai_delay: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Load a session config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = read_file(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Durations as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
