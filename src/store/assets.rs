//! On-disk layout of sticker asset files.
//!
//! ```text
//! {data_dir}/
//! ├── stickers.db
//! └── stickers_asset/
//!     └── {pack identifier}/
//!         ├── tray.png
//!         ├── 01.webp
//!         └── 02.webp
//! ```
//!
//! Database rows and files are managed separately: deleting a pack row never
//! removes its directory, and the functions here never touch the database.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StickerError};
use crate::outcome::Outcome;

/// Directory name under the data directory holding one folder per pack.
pub const ASSET_DIR_NAME: &str = "stickers_asset";

/// True when `segment` can name a file or directory directly under its
/// parent: non-empty, not `.`/`..`, and free of path separators.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

fn check_segment(segment: &str) -> Result<()> {
    if is_safe_segment(segment) {
        Ok(())
    } else {
        Err(StickerError::InvalidAssetName {
            name: segment.to_string(),
        })
    }
}

/// Root of the asset tree.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Asset tree inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join(ASSET_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one pack.
    pub fn pack_dir(&self, identifier: &str) -> Result<PathBuf> {
        check_segment(identifier)?;
        Ok(self.root.join(identifier))
    }

    /// Path of one asset file. Both segments must be safe.
    pub fn asset_path(&self, identifier: &str, file_name: &str) -> Result<PathBuf> {
        check_segment(file_name)?;
        Ok(self.pack_dir(identifier)?.join(file_name))
    }

    /// Create the pack directory if needed.
    pub fn ensure_pack_dir(&self, identifier: &str) -> Result<PathBuf> {
        let dir = self.pack_dir(identifier)?;
        fs::create_dir_all(&dir).map_err(|e| {
            StickerError::Other(format!("Failed to create directory {}: {e}", dir.display()))
        })?;
        Ok(dir)
    }

    pub fn exists(&self, identifier: &str, file_name: &str) -> bool {
        self.asset_path(identifier, file_name)
            .is_ok_and(|p| p.is_file())
    }

    /// Size of an asset file, `None` when it does not exist.
    pub fn size_of(&self, identifier: &str, file_name: &str) -> Result<Option<u64>> {
        let path = self.asset_path(identifier, file_name)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a whole asset file.
    pub fn read(&self, identifier: &str, file_name: &str) -> Result<Vec<u8>> {
        let path = self.asset_path(identifier, file_name)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StickerError::AssetNotFound {
                    path: path.display().to_string(),
                }
            } else {
                StickerError::Io(e)
            }
        })
    }

    /// Copy `source` into the pack directory as `file_name`, replacing any
    /// file already there.
    #[instrument(skip(self), fields(source = %source.display()))]
    pub fn import_file(&self, identifier: &str, source: &Path, file_name: &str) -> Result<PathBuf> {
        let target = self.import_target(identifier, source, file_name)?;
        fs::copy(source, &target).map_err(|e| copy_failed(source, &target, &e))?;
        debug!(target = %target.display(), "Imported asset");
        Ok(target)
    }

    /// Copy `source` into the pack directory as `file_name`. Fails with
    /// [`StickerError::AssetExists`] when that file is already there; the
    /// existing file is left as it was.
    #[instrument(skip(self), fields(source = %source.display()))]
    pub fn import_new_file(&self, identifier: &str, source: &Path, file_name: &str) -> Result<PathBuf> {
        let target = self.import_target(identifier, source, file_name)?;
        let mut dest = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    StickerError::AssetExists {
                        path: target.display().to_string(),
                    }
                } else {
                    StickerError::Io(e)
                }
            })?;
        let copied = File::open(source).and_then(|mut src| io::copy(&mut src, &mut dest));
        if let Err(e) = copied {
            drop(dest);
            let _ = fs::remove_file(&target);
            return Err(copy_failed(source, &target, &e));
        }
        debug!(target = %target.display(), "Imported new asset");
        Ok(target)
    }

    fn import_target(&self, identifier: &str, source: &Path, file_name: &str) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(StickerError::AssetNotFound {
                path: source.display().to_string(),
            });
        }
        self.ensure_pack_dir(identifier)?;
        self.asset_path(identifier, file_name)
    }

    /// Remove the pack directory if it holds nothing. Returns whether it was
    /// removed.
    pub fn prune_pack_dir(&self, identifier: &str) -> Result<bool> {
        let dir = self.pack_dir(identifier)?;
        match fs::read_dir(&dir) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return Ok(false);
                }
                fs::remove_dir(&dir)?;
                debug!(dir = %dir.display(), "Removed empty pack directory");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename an asset file inside its pack directory.
    pub fn rename(&self, identifier: &str, old_name: &str, new_name: &str) -> Result<()> {
        let from = self.asset_path(identifier, old_name)?;
        let to = self.asset_path(identifier, new_name)?;
        fs::rename(&from, &to).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StickerError::AssetNotFound {
                    path: from.display().to_string(),
                }
            } else {
                StickerError::Io(e)
            }
        })
    }

    /// Delete one asset file. Warning if it was already gone.
    #[instrument(skip(self))]
    pub fn delete_asset(&self, identifier: &str, file_name: &str) -> Outcome<PathBuf> {
        let path = match self.asset_path(identifier, file_name) {
            Ok(p) => p,
            Err(e) => return Outcome::Failure(e),
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted asset file");
                Outcome::Success(path)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "Asset file already absent");
                Outcome::Warning(format!("asset file {} not found", path.display()))
            }
            Err(e) => Outcome::Failure(e.into()),
        }
    }

    /// Delete every file of a pack, then its directory. Returns the number
    /// of files removed; Warning if the directory did not exist.
    #[instrument(skip(self))]
    pub fn delete_pack_assets(&self, identifier: &str) -> Outcome<usize> {
        let dir = match self.pack_dir(identifier) {
            Ok(d) => d,
            Err(e) => return Outcome::Failure(e),
        };
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Pack directory already absent");
            return Outcome::Warning(format!("pack directory {} not found", dir.display()));
        }
        Outcome::from_result(remove_pack_dir(&dir))
    }
}

fn copy_failed(source: &Path, target: &Path, e: &io::Error) -> StickerError {
    StickerError::Other(format!(
        "Failed to copy {} to {}: {e}",
        source.display(),
        target.display()
    ))
}

fn remove_pack_dir(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    fs::remove_dir(dir)?;
    info!(dir = %dir.display(), removed, "Deleted pack directory");
    Ok(removed)
}
