//! Path resolution helpers for configuration and manifest files.
//!
//! Supports absolute paths, paths relative to the referencing file, and "~"
//! home directory expansion.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Result, StickerError};

/// Application directory name under the platform data/config dirs.
pub const APP_DIR_NAME: &str = "stickers";

/// Resolve a path found in a config or manifest file.
///
/// Resolution rules:
/// 1. Paths starting with `~`: expanded to home directory
/// 2. Absolute paths: used as-is
/// 3. Relative paths: resolved relative to `base_dir`
pub fn resolve_path(path: &Path, base_dir: &Path) -> Result<PathBuf> {
    trace!(path = %path.display(), base_dir = %base_dir.display(), "Resolving path");

    let path_str = path.to_string_lossy();
    if path_str == "~" || path_str.starts_with("~/") {
        let home = home_dir()?;
        let rest = path_str.strip_prefix("~/").unwrap_or("");
        let resolved = if rest.is_empty() { home } else { home.join(rest) };
        debug!(original = %path.display(), resolved = %resolved.display(), "Expanded home directory path");
        return Ok(resolved);
    }

    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    Ok(base_dir.join(path))
}

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| StickerError::ConfigParse("Could not determine home directory".to_string()))
}

/// Default data directory.
///
/// Location: `~/.local/share/stickers`
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| {
        StickerError::Other("Could not determine local data directory".to_string())
    })?;
    Ok(data_dir.join(APP_DIR_NAME))
}

/// Default settings file.
///
/// Location: `~/.config/stickers/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| StickerError::Other("Could not determine config directory".to_string()))?;
    Ok(config_dir.join(APP_DIR_NAME).join("config.toml"))
}
