//! `config.toml` - user defaults for cm
//!
//! Every field is optional; a missing file means all defaults.

use crate::paths;
use anyhow::{Context, Result};
use jobkit::DEFAULT_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Spec directories scanned when neither the config nor the CLI names any
pub const DEFAULT_SPEC_DIRS: [&str; 2] = ["~/.cmspecs", "./specs"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmConfig {
    /// Candidate spec directories, scanned in order
    pub spec_dirs: Vec<String>,
    /// Capacity of each job event channel
    pub channel_capacity: usize,
    /// Prefix for privileged commands
    pub privilege: String,
    /// Reject spec documents without a NAME
    pub strict: bool,
    pub variables: VariableDefaults,
}

/// Default interpolation variables for `configure`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableDefaults {
    pub class: String,
    pub sequence: String,
    pub locale: String,
}

impl Default for CmConfig {
    fn default() -> Self {
        Self {
            spec_dirs: DEFAULT_SPEC_DIRS.iter().map(ToString::to_string).collect(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            privilege: speckit::DEFAULT_PRIVILEGE.to_string(),
            strict: false,
            variables: VariableDefaults::default(),
        }
    }
}

impl CmConfig {
    /// Load the user's config file, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = paths::config_file()?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Spec directories with `~` and variables expanded
    pub fn spec_dirs(&self) -> Vec<PathBuf> {
        self.spec_dirs.iter().map(|dir| paths::expand(dir)).collect()
    }
}
