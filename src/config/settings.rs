use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::storage;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_HISTORY_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub credentials: CredentialsConfig,
    pub output: OutputConfig,
    pub model: ModelConfig,
    pub history: HistoryConfig,
    pub execution: ExecutionConfig,
    pub setup: SetupConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CredentialsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_style: Option<String>,
    pub use_colors: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub base_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
    /// Record a bare copy (without execution) in the history log.
    pub record_copies: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SetupConfig {
    /// How many times interactive key setup may run before giving up.
    pub max_attempts: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_style: None,
            use_colors: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
            request_timeout_secs: 30,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_HISTORY_ENTRIES,
            record_copies: false,
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

/// Result of reading the config file: the settings plus any warning the
/// user should see (a malformed file falls back to defaults).
#[derive(Debug)]
pub struct Loaded {
    pub settings: Settings,
    pub warning: Option<String>,
}

impl Settings {
    pub fn load_from(path: &Path) -> Loaded {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Loaded {
                    settings: Self::default(),
                    warning: None,
                };
            }
            Err(e) => {
                warn!("Failed to read config file {}: {e}", path.display());
                return Loaded {
                    settings: Self::default(),
                    warning: Some(format!(
                        "Could not read {}: {e}. Using defaults.",
                        path.display()
                    )),
                };
            }
        };

        match toml::from_str::<Settings>(&content) {
            Ok(settings) => Loaded {
                settings,
                warning: None,
            },
            Err(e) => {
                warn!("Malformed config file {}: {e}", path.display());
                Loaded {
                    settings: Self::default(),
                    warning: Some(format!(
                        "Config file {} is malformed ({}). Using defaults.",
                        path.display(),
                        e.message()
                    )),
                }
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialise settings")?;
        storage::write_atomic(path, content.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(storage::config_dir()?.join("config.toml"))
    }

    pub fn execution_timeout(&self) -> Option<std::time::Duration> {
        self.execution
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}
