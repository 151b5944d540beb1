//! Configuration loading and management
//!
//! Handles parsing of `.taskbucket.toml` configuration files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bucket::BucketPolicy;
use crate::zone::Zone;

pub const CONFIG_FILE: &str = ".taskbucket.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Zone the day/week/month boundaries are computed in: `local`, `utc`,
    /// or an IANA name such as `Europe/Berlin`
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Bucketing policy
    #[serde(default)]
    pub buckets: BucketPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            buckets: BucketPolicy::default(),
        }
    }
}

fn default_timezone() -> String {
    "local".to_string()
}

impl Config {
    /// Load configuration from a `.taskbucket.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Err(crate::error::Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|err| crate::error::Error::InvalidConfig(err.message().to_string()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `.taskbucket.toml` from `dir`, or return defaults when it is absent
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn zone(&self) -> crate::error::Result<Zone> {
        Zone::parse(&self.timezone).map_err(|_| {
            crate::error::Error::InvalidConfig(format!(
                "timezone: unknown zone '{}' (expected local|utc|<IANA name>)",
                self.timezone
            ))
        })
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.timezone.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "timezone cannot be empty".to_string(),
            ));
        }
        self.zone()?;
        Ok(())
    }
}
