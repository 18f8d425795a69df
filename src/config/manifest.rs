//! Pack manifests: the file format `stickers import` reads.
//!
//! ```toml
//! identifier = "cats"            # optional, a UUID is generated when absent
//! name = "Cats"
//! publisher = "Jane"
//! tray_image = "art/tray.png"    # relative to the manifest
//! animated = false
//!
//! [links]
//! publisher_website = "https://example.com"
//!
//! [[stickers]]
//! file = "art/01.webp"
//! emojis = ["😺"]
//! accessibility_text = "a grinning cat"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::format::load_file;
use super::path::resolve_path;
use crate::error::{Result, StickerError};
use crate::pack::{PackLinks, Sticker, StickerPack};
use crate::store::is_safe_segment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackManifest {
    #[serde(default)]
    pub identifier: Option<String>,
    pub name: String,
    pub publisher: String,
    pub tray_image: PathBuf,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub avoid_cache: bool,
    #[serde(default)]
    pub links: PackLinks,
    #[serde(default)]
    pub stickers: Vec<StickerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerEntry {
    pub file: PathBuf,
    #[serde(default)]
    pub emojis: Vec<String>,
    #[serde(default)]
    pub accessibility_text: String,
}

/// A file to copy into the pack's asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub file_name: String,
    pub source: PathBuf,
}

/// Everything needed to import one pack.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub pack: StickerPack,
    /// Tray image first, then stickers in manifest order.
    pub files: Vec<AssetSource>,
}

impl PackManifest {
    #[instrument]
    pub fn load(path: &Path) -> Result<(Self, PathBuf)> {
        let manifest: Self = load_file(path)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        debug!(stickers = manifest.stickers.len(), "Manifest parsed");
        Ok((manifest, base))
    }

    /// Build the pack and its file list. Source paths resolve against
    /// `base_dir`; the stored file name is the source's final component.
    pub fn into_plan(self, base_dir: &Path) -> Result<ImportPlan> {
        let identifier = self
            .identifier
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let tray = asset_source(&self.tray_image, base_dir)?;
        let mut pack = StickerPack::new(identifier, self.name, self.publisher, tray.file_name.clone())
            .with_animated(self.animated)
            .with_avoid_cache(self.avoid_cache)
            .with_links(self.links);

        let mut files = vec![tray];
        for entry in self.stickers {
            let source = asset_source(&entry.file, base_dir)?;
            pack.add_sticker(Sticker::new(
                source.file_name.clone(),
                entry.emojis,
                entry.accessibility_text,
            ));
            files.push(source);
        }
        Ok(ImportPlan { pack, files })
    }
}

fn asset_source(path: &Path, base_dir: &Path) -> Result<AssetSource> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| is_safe_segment(n))
        .ok_or_else(|| StickerError::InvalidAssetName {
            name: path.display().to_string(),
        })?
        .to_string();
    Ok(AssetSource {
        file_name,
        source: resolve_path(path, base_dir)?,
    })
}
