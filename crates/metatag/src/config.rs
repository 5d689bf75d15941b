//! Configuration for metatag
//!
//! Read from `config.toml` in the metatag home. Every field is optional; a
//! missing file means all defaults.

use crate::engine::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_FILE: &str = "metatag.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetatagConfig {
    /// Database location. Relative paths are taken from the metatag home;
    /// unset means `<home>/metatag.sqlite3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Appended to a media file's path to name its sidecar.
    #[serde(default = "default_sidecar_suffix")]
    pub sidecar_suffix: String,

    /// Rows shown by `history show` when no limit is given.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Skip directories whose name starts with a dot while scanning.
    #[serde(default = "default_skip_hidden_dirs")]
    pub skip_hidden_dirs: bool,
}

fn default_sidecar_suffix() -> String {
    ".meta.json".to_string()
}

fn default_history_limit() -> u32 {
    50
}

fn default_skip_hidden_dirs() -> bool {
    true
}

impl Default for MetatagConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            sidecar_suffix: default_sidecar_suffix(),
            history_limit: default_history_limit(),
            skip_hidden_dirs: default_skip_hidden_dirs(),
        }
    }
}

impl MetatagConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MetatagConfig =
            toml::from_str(&content).map_err(|e| EngineError::Config(e.to_string()))?;
        Ok(config)
    }

    /// `<home>/config.toml` if present, otherwise defaults.
    pub fn load_or_default(home: &Path) -> Result<Self> {
        let path = home.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn resolve_database_path(&self, home: &Path) -> PathBuf {
        match &self.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => home.join(path),
            None => home.join(DATABASE_FILE),
        }
    }
}
