use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

use crate::config::{ConfigKey, ConfigStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    Interactive,
    Plain,
}

impl PresentationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PresentationMode::Interactive => "interactive",
            PresentationMode::Plain => "plain",
        }
    }
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" | "tui" => Ok(PresentationMode::Interactive),
            "plain" | "inline" => Ok(PresentationMode::Plain),
            other => Err(format!(
                "unknown output style '{other}' (expected interactive or plain)"
            )),
        }
    }
}

/// A style as written by the user: `auto` defers to the next rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChoice {
    Auto,
    Fixed(PresentationMode),
}

impl StyleChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            StyleChoice::Auto => "auto",
            StyleChoice::Fixed(mode) => mode.as_str(),
        }
    }

    pub fn mode(self) -> Option<PresentationMode> {
        match self {
            StyleChoice::Auto => None,
            StyleChoice::Fixed(mode) => Some(mode),
        }
    }
}

impl FromStr for StyleChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(StyleChoice::Auto);
        }
        s.parse().map(StyleChoice::Fixed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationDecision {
    pub mode: PresentationMode,
    pub warning: Option<String>,
}

/// Explicit override, then persisted default, then terminal detection.
/// Never fails: a bad persisted value is reported and skipped.
pub struct PresentationResolver {
    stdout_is_terminal: bool,
}

impl PresentationResolver {
    pub fn new(stdout_is_terminal: bool) -> Self {
        Self { stdout_is_terminal }
    }

    pub fn detect() -> Self {
        Self::new(console::Term::stdout().is_term())
    }

    pub fn resolve(
        &self,
        explicit: Option<PresentationMode>,
        store: &dyn ConfigStore,
    ) -> PresentationDecision {
        if let Some(mode) = explicit {
            return PresentationDecision {
                mode,
                warning: None,
            };
        }

        let mut warning = None;
        if let Some(persisted) = store.get(ConfigKey::OutputStyle) {
            match persisted.parse::<StyleChoice>() {
                Ok(StyleChoice::Fixed(mode)) => {
                    debug!("Using persisted output style {mode}");
                    return PresentationDecision {
                        mode,
                        warning: None,
                    };
                }
                Ok(StyleChoice::Auto) => {}
                Err(e) => {
                    warn!("Ignoring persisted output style: {e}");
                    warning = Some(format!(
                        "Ignoring invalid default output style '{persisted}' in config"
                    ));
                }
            }
        }

        let mode = if self.stdout_is_terminal {
            PresentationMode::Interactive
        } else {
            PresentationMode::Plain
        };
        PresentationDecision { mode, warning }
    }
}
