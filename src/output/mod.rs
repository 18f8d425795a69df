//! Output mode abstraction for robot and human output.

use std::path::Path;

use serde::Serialize;

use crate::cli::Cli;
use crate::content::{AssetFile, ResultTable};
use crate::error::StickerError;
use crate::pack::StickerPack;
use crate::service::{FetchedPacks, PackHealth, Revalidation, UpdateStatus};

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// What a delete command removed.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteSummary {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Database rows removed, cascaded sticker rows included.
    pub rows: usize,
    /// Asset files removed; `None` when files were kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_removed: Option<usize>,
}

/// Result of an import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub identifier: String,
    pub name: String,
    pub stickers: usize,
    pub invalid_stickers: Vec<InvalidSticker>,
    pub total_size: u64,
    pub converted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidSticker {
    pub file_name: String,
    pub marker: String,
}

impl ImportSummary {
    pub fn from_pack(pack: &StickerPack, converted: bool) -> Self {
        Self {
            identifier: pack.identifier.clone(),
            name: pack.name.clone(),
            stickers: pack.stickers.len(),
            invalid_stickers: pack
                .invalid_stickers()
                .map(|s| InvalidSticker {
                    file_name: s.file_name.clone(),
                    marker: s.validity_marker.clone(),
                })
                .collect(),
            total_size: pack.total_size(),
            converted,
        }
    }
}

/// Build metadata shown by `stickers version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
    pub target: &'static str,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { color: bool },
}

impl OutputMode {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human { color: !cli.no_color }
        }
    }

    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &StickerError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Packs
    fn imported(&self, summary: &ImportSummary);
    fn pack_list(&self, packs: &FetchedPacks);
    fn pack_detail(&self, pack: &StickerPack, health: PackHealth);
    fn update_status(&self, action: &str, identifier: &str, status: UpdateStatus);
    fn deleted(&self, summary: &DeleteSummary);
    fn revalidation(&self, result: &Revalidation);

    // Content access
    fn table(&self, table: &ResultTable);
    fn asset(&self, asset: &AssetFile);

    // Utilities
    fn converted(&self, input: &Path, output: &Path);
    fn config_written(&self, config_path: &Path, data_dir: &Path);
    fn version_info(&self, info: &VersionInfo);
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < KIB * KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MiB", bytes as f64 / (KIB * KIB) as f64)
    }
}
