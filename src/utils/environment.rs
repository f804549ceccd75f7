use std::env;
use std::fmt;
use std::fs;

use crate::utils::shell::ShellDetector;

/// OS and shell labels embedded into every prompt. Computed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContext {
    pub os_label: String,
    pub shell_label: String,
}

impl PlatformContext {
    pub fn new(os_label: impl Into<String>, shell_label: impl Into<String>) -> Self {
        Self {
            os_label: os_label.into(),
            shell_label: shell_label.into(),
        }
    }
}

impl fmt::Display for PlatformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operating System: {}, Shell: {}",
            self.os_label, self.shell_label
        )
    }
}

pub struct EnvironmentDetector;

impl Default for EnvironmentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_platform(&self) -> PlatformContext {
        PlatformContext::new(self.detect_os_label(), ShellDetector::shell_label())
    }

    fn detect_os_label(&self) -> String {
        match env::consts::OS {
            "linux" => {
                let release = fs::read_to_string("/etc/os-release")
                    .or_else(|_| fs::read_to_string("/usr/lib/os-release"))
                    .ok();
                match release.as_deref().and_then(distro_name) {
                    Some(distro) => format!("Linux ({distro})"),
                    None => "Linux".to_string(),
                }
            }
            "macos" => "macOS".to_string(),
            "windows" => "Windows".to_string(),
            "freebsd" => "FreeBSD".to_string(),
            other => other.to_string(),
        }
    }
}

/// `PRETTY_NAME`, falling back to `NAME`, from an os-release file.
fn distro_name(os_release: &str) -> Option<String> {
    let field = |key: &str| {
        os_release.lines().find_map(|line| {
            let value = line.trim().strip_prefix(key)?.strip_prefix('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'').trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    };
    field("PRETTY_NAME").or_else(|| field("NAME"))
}
