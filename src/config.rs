//! Engine configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_components_dir")]
    pub components_dir: PathBuf,
    /// Template file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_components_dir() -> PathBuf { PathBuf::from("components") }
fn default_extensions() -> Vec<String> { vec!["html".to_string()] }
fn default_max_depth() -> usize { DEFAULT_MAX_DEPTH }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            components_dir: default_components_dir(),
            extensions: default_extensions(),
            max_depth: default_max_depth(),
            follow_symlinks: false,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_components_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.components_dir = dir.into();
        self
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| {
                self.extensions.iter().any(|known| known.trim_start_matches('.') == ext)
            })
    }
}
