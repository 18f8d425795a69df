//! YAML / TOML file formats shared by settings and manifests.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{Result, StickerError};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        trace!(extension = %ext, "Detecting config format from extension");
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    /// Parse `content` in this format.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        match self {
            Self::Yaml => serde_yaml::from_str(content)
                .map_err(|e| StickerError::ConfigParse(format!("YAML: {e}"))),
            Self::Toml => {
                toml::from_str(content).map_err(|e| StickerError::ConfigParse(format!("TOML: {e}")))
            }
        }
    }
}

/// Read and parse a YAML or TOML file, picking the format from its extension.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = ConfigFormat::from_extension(path).ok_or_else(|| {
        StickerError::ConfigParse(format!(
            "{}: unsupported extension, expected .toml, .yaml or .yml",
            path.display()
        ))
    })?;
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StickerError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            StickerError::Io(e)
        }
    })?;
    debug!(path = %path.display(), ?format, "Parsing file");
    format
        .parse(&content)
        .map_err(|e| StickerError::ConfigParse(format!("{}: {e}", path.display())))
}
