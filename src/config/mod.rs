//! Settings, pack manifests and path resolution.
//!
//! Settings come from `~/.config/stickers/config.toml` (or YAML) unless a
//! file is passed with `--config`. Manifests describe one pack to import.

mod format;
mod manifest;
mod path;
mod settings;

pub use format::{ConfigFormat, load_file};
pub use manifest::{AssetSource, ImportPlan, PackManifest, StickerEntry};
pub use path::{APP_DIR_NAME, default_config_path, default_data_dir, home_dir, resolve_path};
pub use settings::{DEFAULT_AUTHORITY, DEFAULT_OWNER_PACKAGE, DEFAULT_PRIVILEGED_CALLERS, Settings};
