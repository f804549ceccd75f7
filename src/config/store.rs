use anyhow::{bail, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::config::settings::Loaded;
use crate::config::Settings;

/// Persisted values the core reads and writes through [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiKey,
    OutputStyle,
}

impl ConfigKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::ApiKey => "credentials.api_key",
            ConfigKey::OutputStyle => "output.default_style",
        }
    }

    fn read(self, settings: &Settings) -> Option<&String> {
        match self {
            ConfigKey::ApiKey => settings.credentials.api_key.as_ref(),
            ConfigKey::OutputStyle => settings.output.default_style.as_ref(),
        }
    }

    fn write(self, settings: &mut Settings, value: &str) {
        let slot = match self {
            ConfigKey::ApiKey => &mut settings.credentials.api_key,
            ConfigKey::OutputStyle => &mut settings.output.default_style,
        };
        *slot = Some(value.to_string());
    }
}

pub trait ConfigStore {
    fn get(&self, key: ConfigKey) -> Option<String>;
    fn set(&mut self, key: ConfigKey, value: &str) -> Result<()>;
}

/// The on-disk TOML config, loaded once and handed to the resolvers.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    settings: Settings,
    ignore_persisted: bool,
    warning: Option<String>,
}

impl ConfigFile {
    pub fn open(path: PathBuf, ignore_persisted: bool) -> Self {
        let loaded = if ignore_persisted {
            debug!("Ignoring persisted configuration");
            Loaded {
                settings: Settings::default(),
                warning: None,
            }
        } else {
            Settings::load_from(&path)
        };

        Self {
            path,
            settings: loaded.settings,
            ignore_persisted,
            warning: loaded.warning,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Warning produced while loading, if the file was unreadable or malformed.
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }
}

impl ConfigStore for ConfigFile {
    fn get(&self, key: ConfigKey) -> Option<String> {
        if self.ignore_persisted {
            return None;
        }
        key.read(&self.settings)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        // Re-read so keys changed by another process since startup survive.
        let Loaded {
            settings: mut on_disk,
            warning,
        } = Settings::load_from(&self.path);
        if warning.is_some() {
            bail!(
                "Refusing to overwrite unreadable config {}; fix or remove it first",
                self.path.display()
            );
        }
        key.write(&mut on_disk, value);
        on_disk.save_to(&self.path)?;
        debug!("Persisted {} to {}", key.as_str(), self.path.display());

        key.write(&mut self.settings, value);
        self.ignore_persisted = false;
        Ok(())
    }
}

/// In-memory store used by tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryConfig {
    pub settings: Settings,
    pub writes: Vec<(ConfigKey, String)>,
}

#[cfg(test)]
impl ConfigStore for MemoryConfig {
    fn get(&self, key: ConfigKey) -> Option<String> {
        key.read(&self.settings)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        key.write(&mut self.settings, value);
        self.writes.push((key, value.to_string()));
        Ok(())
    }
}
