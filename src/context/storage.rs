use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Overrides both the config and data directory; used by tests and
/// portable installs.
pub const HOME_ENV_VAR: &str = "ONELINER_HOME";
const APP_DIR: &str = "oneliner";

pub fn config_dir() -> Result<PathBuf> {
    app_dir(dirs::config_dir())
}

pub fn data_dir() -> Result<PathBuf> {
    app_dir(dirs::data_dir())
}

fn app_dir(platform_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    let base = platform_dir
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(base.join(APP_DIR))
}

/// Writes `contents` to a sibling temp file and renames it over `path`, so a
/// concurrent reader sees either the old file or the new one, never a
/// partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| APP_DIR.to_string());
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            log::debug!("Could not remove temp file {}: {e}", tmp_path.display());
        }
    }
    result
}

/// Removes a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
