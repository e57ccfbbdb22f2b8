use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::Result;

pub const DEFAULT_DATA_FILE: &str = "daka_records.csv";
pub const DEFAULT_IMAGE_DIR: &str = "images";

/// Where the record file and photo directory live.
///
/// Resolved from defaults, then an optional JSON file, then the
/// `DAKA_DATA_FILE` / `DAKA_IMAGE_DIR` environment variables:
/// ```json
/// {
///   "data_file": "/home/me/.daka/records.csv",
///   "image_dir": "/home/me/.daka/images"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DakaConfig {
    pub data_file: PathBuf,
    pub image_dir: PathBuf,
}

impl Default for DakaConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
        }
    }
}

impl DakaConfig {
    /// Loads the config from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies overrides from a lookup such as `std::env::var`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DAKA_DATA_FILE").filter(|v| !v.is_empty()) {
            self.data_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("DAKA_IMAGE_DIR").filter(|v| !v.is_empty()) {
            self.image_dir = PathBuf::from(v);
        }
        self
    }

    /// Defaults, then `config_file` if given, then the process environment.
    pub fn resolve(config_file: Option<&Path>) -> Result<Self> {
        let base = match config_file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_env(|key| std::env::var(key).ok()))
    }
}
