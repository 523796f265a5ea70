use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use undoable::Profile;

use crate::paths;

pub const CONFIG_FILE: &str = "config.toml";

/// Optional user defaults, read from `config.toml` in the config directory.
///
/// Every key is optional; command-line flags always win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostTuneConfig {
    /// Where run directories are created (`~` and `$VARS` are expanded)
    #[serde(default)]
    pub backup_root: Option<String>,

    /// Profile used when `--profile` is not given
    #[serde(default)]
    pub profile: Option<String>,

    /// Create a system restore point before every apply
    #[serde(default)]
    pub restore_point: bool,
}

impl HostTuneConfig {
    /// Path of the config file
    pub fn path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the config file, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // Surface a bad profile name at load time rather than mid-command
        config.default_profile()?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Configured default profile, if any
    pub fn default_profile(&self) -> Result<Option<Profile>> {
        self.profile
            .as_deref()
            .map(|name| {
                name.parse::<Profile>()
                    .map_err(|e| anyhow::anyhow!("Invalid profile in {CONFIG_FILE}: {e}"))
            })
            .transpose()
    }
}
