//! Game rule switches.
//!
//! Rules travel with the board so a snapshot always adjudicates the same way.
//! They can also be loaded from a standalone JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading rules.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read rules file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Variant rules that change how builds and diplomacy are adjudicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Builds need ownership of the center but not a core on it.
    pub build_anywhere: bool,
    /// Resolve vassal, liege and dual-monarchy orders in the builds phase.
    pub vassal_system: bool,
    /// Disband the units farthest from home when a player orders too few
    /// disbands.
    pub civil_disorder: bool,
}

impl GameRules {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
