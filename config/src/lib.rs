//! Configuration for Tumbler.
//!
//! Read from `~/.tumbler/config.toml`, or from the file named by
//! `TUMBLER_CONFIG`. Every section and key is optional:
//!
//! ```toml
//! [unlocker]
//! target = "T"
//! phase_b_rounds = 4
//! seed = 42
//!
//! [device]
//! size = 4
//! budget = 2
//! policy = { kind = "polynomial", step = 1, multiplier = 3 }
//! ```

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

use tumbler_core::UnlockSettings;
use tumbler_types::{DEFAULT_BUDGET, DEFAULT_SIZE, RotationPolicy, bit_from_glyph};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "TUMBLER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TumblerConfig {
    pub unlocker: Option<UnlockerConfig>,
    pub device: Option<DeviceConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnlockerConfig {
    /// Value disclosed bits are forced to: "T" or "F". Default: "T".
    pub target: Option<String>,
    /// Rounds of the randomized fallback. Default: 4.
    pub phase_b_rounds: Option<u32>,
    /// Seed for reproducible runs.
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeviceConfig {
    pub size: Option<usize>,
    pub budget: Option<usize>,
    /// Rotation policy for rings built from this section. Trials ignore it
    /// and cycle through every policy.
    pub policy: Option<RotationPolicy>,
}

/// Validated ring dimensions and optional policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceShape {
    pub size: usize,
    pub budget: usize,
    pub policy: Option<RotationPolicy>,
}

impl TumblerConfig {
    /// Load the config from its default location.
    ///
    /// A missing file is not an error: it yields `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = Self::path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content, path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(".tumbler").join("config.toml"))
    }

    pub fn unlock_settings(&self) -> Result<UnlockSettings, ConfigError> {
        let mut settings = UnlockSettings::default();
        let Some(unlocker) = &self.unlocker else {
            return Ok(settings);
        };

        if let Some(target) = &unlocker.target {
            settings.target = parse_target(target)?;
        }
        if let Some(rounds) = unlocker.phase_b_rounds {
            settings.phase_b_rounds = rounds;
        }
        settings.seed = unlocker.seed;
        Ok(settings)
    }

    pub fn device_shape(&self) -> Result<DeviceShape, ConfigError> {
        let device = self.device.as_ref();
        let size = device.and_then(|d| d.size).unwrap_or(DEFAULT_SIZE);
        let budget = device
            .and_then(|d| d.budget)
            .unwrap_or(DEFAULT_BUDGET.min(size));

        if size == 0 {
            return Err(ConfigError::Invalid {
                field: "device.size",
                reason: "a ring needs at least one bit".to_string(),
            });
        }
        if budget > size {
            return Err(ConfigError::Invalid {
                field: "device.budget",
                reason: format!("budget {budget} exceeds ring size {size}"),
            });
        }
        Ok(DeviceShape {
            size,
            budget,
            policy: device.and_then(|d| d.policy),
        })
    }
}

fn parse_target(raw: &str) -> Result<bool, ConfigError> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), None) => bit_from_glyph(glyph.to_ascii_uppercase()),
        _ => None,
    }
    .ok_or_else(|| ConfigError::Invalid {
        field: "unlocker.target",
        reason: format!("expected \"T\" or \"F\", got {raw:?}"),
    })
}
