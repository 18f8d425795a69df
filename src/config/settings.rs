//! Application settings.
//!
//! # Example TOML
//!
//! ```toml
//! data_dir = "~/stickers"
//! authority = "com.example.stickers.provider"
//! owner_package = "com.example.stickers"
//! privileged_callers = ["com.whatsapp", "com.whatsapp.w4b"]
//! whitelisted_packs = ["cats"]
//! write_threads = 2
//!
//! [limits]
//! min_pack_size = 3
//! max_pack_size = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::format::load_file;
use super::path::{default_config_path, default_data_dir, resolve_path};
use crate::error::{Result, StickerError};
use crate::store::{AssetStore, DB_FILE_NAME};
use crate::validation::Limits;

/// Content authority used when none is configured.
pub const DEFAULT_AUTHORITY: &str = "com.example.stickers.provider";
/// Package identity of this application when none is configured.
pub const DEFAULT_OWNER_PACKAGE: &str = "com.example.stickers";
/// Consumers allowed to read assets of packs they have not whitelisted yet.
pub const DEFAULT_PRIVILEGED_CALLERS: [&str; 2] = ["com.whatsapp", "com.whatsapp.w4b"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Holds the database and the asset tree. Empty means the platform default.
    pub data_dir: PathBuf,
    pub authority: String,
    pub owner_package: String,
    pub privileged_callers: Vec<String>,
    /// Packs the consumer already accepted; their assets are open to every caller.
    pub whitelisted_packs: Vec<String>,
    pub write_threads: usize,
    /// Per-request timeout of the HTTP boundary.
    pub request_timeout_secs: u64,
    pub limits: Limits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            authority: DEFAULT_AUTHORITY.to_string(),
            owner_package: DEFAULT_OWNER_PACKAGE.to_string(),
            privileged_callers: DEFAULT_PRIVILEGED_CALLERS.iter().map(|s| (*s).to_string()).collect(),
            whitelisted_packs: Vec::new(),
            write_threads: 2,
            request_timeout_secs: 10,
            limits: Limits::default(),
        }
    }
}

impl Settings {
    /// Load from an explicit TOML or YAML file. Relative `data_dir` values
    /// resolve against the file's directory.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings: Self = load_file(path)?;
        if !settings.data_dir.as_os_str().is_empty() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            settings.data_dir = resolve_path(&settings.data_dir, base)?;
        }
        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Load `explicit` if given (it must exist), else the default file if it
    /// exists, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Ok(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Override the data directory (CLI flag / environment).
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Data directory with `~` expanded and the platform default applied.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        if self.data_dir.as_os_str().is_empty() {
            return default_data_dir();
        }
        resolve_path(&self.data_dir, Path::new("."))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.resolved_data_dir()?.join(DB_FILE_NAME))
    }

    pub fn asset_store(&self) -> Result<AssetStore> {
        Ok(AssetStore::new(&self.resolved_data_dir()?))
    }

    /// Reject settings no component can work with.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.min_pack_size > limits.max_pack_size {
            return Err(StickerError::ConfigParse(format!(
                "limits.min_pack_size ({}) exceeds limits.max_pack_size ({})",
                limits.min_pack_size, limits.max_pack_size
            )));
        }
        if limits.tray_min_dimension > limits.tray_max_dimension {
            return Err(StickerError::ConfigParse(
                "limits.tray_min_dimension exceeds limits.tray_max_dimension".to_string(),
            ));
        }
        if self.authority.trim().is_empty() {
            return Err(StickerError::ConfigParse("authority must not be empty".to_string()));
        }
        Ok(())
    }

    /// Render as TOML (used by `stickers init`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StickerError::ConfigParse(e.to_string()))
    }
}
