use log::{debug, info, warn};
use std::fmt;

use crate::config::{ConfigKey, ConfigStore};
use crate::error::CredentialError;

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Override,
    Environment,
    Config,
}

/// API secret. `Debug` and `Display` only ever show a masked form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret: String,
    source: CredentialSource,
}

impl Credential {
    pub fn expose(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.secret.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &self.masked())
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Found(Credential),
    NeedsSetup,
}

/// Outcome of the interactive setup collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupResult {
    Entered(String),
    Cancelled,
}

pub trait CredentialSetup {
    fn prompt_for_credential(&mut self) -> SetupResult;
}

/// First match wins: override, then environment, then persisted config.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    override_key: Option<String>,
    env_key: Option<String>,
}

impl CredentialResolver {
    pub fn new(override_key: Option<String>, env_key: Option<String>) -> Self {
        Self {
            override_key,
            env_key,
        }
    }

    /// Captures the environment variable once, at invocation start.
    pub fn from_process(override_key: Option<String>) -> Self {
        Self::new(override_key, std::env::var(API_KEY_ENV_VAR).ok())
    }

    pub fn resolve(&self, store: &dyn ConfigStore) -> Resolved {
        let candidates = [
            (self.override_key.clone(), CredentialSource::Override),
            (self.env_key.clone(), CredentialSource::Environment),
            (store.get(ConfigKey::ApiKey), CredentialSource::Config),
        ];

        for (value, source) in candidates {
            if let Some(secret) = value.map(|v| v.trim().to_string()) {
                if !secret.is_empty() {
                    debug!("Using API key from {source:?}");
                    return Resolved::Found(Credential { secret, source });
                }
            }
        }

        Resolved::NeedsSetup
    }
}

/// Resolves the credential, running interactive setup when nothing is
/// configured. A freshly entered key is persisted before resolution is
/// retried. With the default `max_attempts` of 1 a cancelled or unusable
/// setup is final.
pub fn acquire_credential(
    resolver: &CredentialResolver,
    store: &mut dyn ConfigStore,
    setup: &mut dyn CredentialSetup,
    max_attempts: u32,
) -> Result<Credential, CredentialError> {
    if let Resolved::Found(credential) = resolver.resolve(store) {
        return Ok(credential);
    }

    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        info!("No API key configured, starting setup (attempt {attempt}/{attempts})");

        let entered = match setup.prompt_for_credential() {
            SetupResult::Entered(key) => key,
            SetupResult::Cancelled => return Err(CredentialError::SetupCancelled),
        };

        let entered = entered.trim();
        if !entered.is_empty() {
            if let Err(e) = store.set(ConfigKey::ApiKey, entered) {
                warn!("Failed to persist API key: {e}");
                return Ok(Credential {
                    secret: entered.to_string(),
                    source: CredentialSource::Config,
                });
            }
        }

        if let Resolved::Found(credential) = resolver.resolve(store) {
            return Ok(credential);
        }
        warn!("API key still missing after setup attempt {attempt}");
    }

    Err(CredentialError::Missing)
}
