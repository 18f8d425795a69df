//! Human-friendly output implementation using console styles.

use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::content::{AssetFile, CellValue, ResultTable};
use crate::error::StickerError;
use crate::pack::StickerPack;
use crate::service::{FetchedPacks, PackHealth, Revalidation, UpdateStatus};
use crate::theme::StickerTheme;

use super::{DeleteSummary, ImportSummary, Output, VersionInfo, format_bytes};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: StickerTheme,
}

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool) -> Self {
        debug!("Creating HumanOutput");
        console::set_colors_enabled(color);
        console::set_colors_enabled_stderr(color);
        Self {
            theme: StickerTheme::default(),
        }
    }

    fn health_label(health: PackHealth) -> &'static str {
        match health {
            PackHealth::Valid => "valid",
            PackHealth::ValidWithInvalidStickers => "partially valid",
            PackHealth::Invalid => "invalid",
        }
    }

    fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!(
            "  {:<14} {}",
            self.theme.label.apply_to(format!("{label}:")),
            self.theme.value.apply_to(value)
        );
    }

    fn optional_field(&self, label: &str, value: Option<&String>) {
        if let Some(value) = value {
            self.field(label, value);
        }
    }

    fn pack_line(&self, health: PackHealth, pack: &StickerPack) {
        let label = Self::health_label(health);
        println!(
            "  {} {} {} {}",
            self.theme.identifier.apply_to(format!("{:<36}", pack.identifier)),
            self.theme.value.apply_to(&pack.name),
            self.theme.muted.apply_to(format!(
                "({} stickers, {})",
                pack.stickers.len(),
                format_bytes(pack.total_size())
            )),
            self.theme.health(health).apply_to(label),
        );
    }
}

fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => "-".to_string(),
        CellValue::Integer(n) => n.to_string(),
        CellValue::Text(s) => s.clone(),
    }
}

impl Output for HumanOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &StickerError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!(
            "{} {}",
            self.theme.error.apply_to("[ERR]"),
            console::style(error).bold()
        );
        if let StickerError::Validation(failure) = error {
            eprintln!(
                "      {} {}",
                self.theme.label.apply_to("code:"),
                self.theme.marker.apply_to(failure.code.token())
            );
        }
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!(
                "      {} {}",
                self.theme.label.apply_to("hint:"),
                self.theme.muted.apply_to(suggestion)
            );
        }
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        eprintln!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        println!("{} {message}", self.theme.accent.apply_to("[INFO]"));
    }

    fn imported(&self, summary: &ImportSummary) {
        println!(
            "{} Saved pack {} ({} stickers, {}){}",
            self.theme.success.apply_to("[OK]"),
            self.theme.identifier.apply_to(&summary.identifier),
            summary.stickers,
            format_bytes(summary.total_size),
            if summary.converted { ", converted" } else { "" }
        );
        for sticker in &summary.invalid_stickers {
            println!(
                "     {} {} {}",
                self.theme.warning.apply_to("flagged"),
                sticker.file_name,
                self.theme.marker.apply_to(&sticker.marker)
            );
        }
    }

    #[instrument(skip(self, packs), fields(count = packs.len()))]
    fn pack_list(&self, packs: &FetchedPacks) {
        if packs.is_empty() {
            println!("{}", self.theme.muted.apply_to("No sticker packs stored."));
            return;
        }
        println!(
            "{}",
            self.theme
                .header
                .apply_to(format!("Sticker packs ({})", packs.len()))
        );
        for (health, pack) in packs.iter() {
            self.pack_line(health, pack);
        }
    }

    fn pack_detail(&self, pack: &StickerPack, health: PackHealth) {
        println!(
            "{} {}",
            self.theme.header.apply_to(&pack.name),
            self.theme.health(health).apply_to(format!("[{}]", Self::health_label(health)))
        );
        self.field("identifier", &pack.identifier);
        self.field("publisher", &pack.publisher);
        self.field("tray", &pack.tray_image);
        self.field("kind", if pack.animated { "animated" } else { "static" });
        self.field("data version", &pack.image_data_version);
        self.field("avoid cache", pack.avoid_cache);
        self.optional_field("email", pack.publisher_email.as_ref());
        self.optional_field("website", pack.publisher_website.as_ref());
        self.optional_field("privacy", pack.privacy_policy_website.as_ref());
        self.optional_field("license", pack.license_agreement_website.as_ref());
        self.optional_field("play store", pack.android_store_link.as_ref());
        self.optional_field("app store", pack.ios_store_link.as_ref());
        self.field("total size", format_bytes(pack.total_size()));

        println!();
        println!("{}", self.theme.header.apply_to(format!("Stickers ({})", pack.stickers.len())));
        for sticker in &pack.stickers {
            let marker = if sticker.is_valid() {
                String::new()
            } else {
                format!(" {}", self.theme.marker.apply_to(&sticker.validity_marker))
            };
            println!(
                "  {:<24} {} {}{marker}",
                sticker.file_name,
                self.theme.emoji.apply_to(sticker.emojis.join(" ")),
                self.theme.muted.apply_to(&sticker.accessibility_text),
            );
        }
    }

    fn update_status(&self, action: &str, identifier: &str, status: UpdateStatus) {
        match status {
            UpdateStatus::Updated => println!(
                "{} {action}: {}",
                self.theme.success.apply_to("[OK]"),
                self.theme.identifier.apply_to(identifier)
            ),
            UpdateStatus::Unchanged => println!(
                "{} {action}: {} already up to date",
                self.theme.accent.apply_to("[INFO]"),
                self.theme.identifier.apply_to(identifier)
            ),
        }
    }

    fn deleted(&self, summary: &DeleteSummary) {
        let target = match &summary.file_name {
            Some(file) => format!("{}/{file}", summary.identifier),
            None => summary.identifier.clone(),
        };
        let files = summary
            .files_removed
            .map_or_else(|| "files kept".to_string(), |n| format!("{n} files removed"));
        println!(
            "{} Deleted {} ({} rows, {files})",
            self.theme.success.apply_to("[OK]"),
            self.theme.identifier.apply_to(target),
            summary.rows
        );
    }

    fn revalidation(&self, result: &Revalidation) {
        println!(
            "{} {}",
            self.theme.header.apply_to(format!("Validation of {}", result.identifier)),
            self.theme
                .health(result.health)
                .apply_to(format!("[{}]", Self::health_label(result.health)))
        );
        if result.report.is_valid() {
            println!("  {}", self.theme.success.apply_to("No problems found."));
        }
        if let Some(failure) = &result.report.pack {
            println!(
                "  {} {} {}",
                self.theme.error.apply_to("pack"),
                self.theme.marker.apply_to(failure.code.token()),
                failure.message
            );
        }
        for (file, failure) in &result.report.stickers {
            println!(
                "  {:<24} {} {}",
                file,
                self.theme.marker.apply_to(failure.code.token()),
                self.theme.muted.apply_to(&failure.message)
            );
        }
        for (file, marker) in &result.changed {
            let shown = if marker.is_empty() { "cleared" } else { marker.as_str() };
            println!("  {} {file}: {shown}", self.theme.accent.apply_to("updated"));
        }
    }

    fn table(&self, table: &ResultTable) {
        for (i, row) in table.rows().iter().enumerate() {
            if i > 0 {
                println!();
            }
            for (column, cell) in table.columns().iter().zip(row) {
                println!(
                    "{} {}",
                    self.theme.label.apply_to(format!("{column:>40}:")),
                    cell_text(cell)
                );
            }
        }
        println!(
            "{}",
            self.theme.muted.apply_to(format!("({} rows)", table.len()))
        );
    }

    fn asset(&self, asset: &AssetFile) {
        println!(
            "{} {} {}",
            self.theme.success.apply_to("[OK]"),
            asset.path.display(),
            self.theme.muted.apply_to(format!("{}, {}", asset.mime_type, format_bytes(asset.len)))
        );
    }

    fn converted(&self, input: &Path, output: &Path) {
        println!(
            "{} Converted {} -> {}",
            self.theme.success.apply_to("[OK]"),
            input.display(),
            self.theme.value.apply_to(output.display())
        );
    }

    fn config_written(&self, config_path: &Path, data_dir: &Path) {
        println!(
            "{} Wrote {}",
            self.theme.success.apply_to("[OK]"),
            self.theme.value.apply_to(config_path.display())
        );
        self.field("data dir", data_dir.display());
    }

    fn version_info(&self, info: &VersionInfo) {
        println!(
            "{} {}",
            self.theme.header.apply_to("stickers"),
            self.theme.value.apply_to(info.version)
        );
        let dirty = if info.git_dirty { " (dirty)" } else { "" };
        self.field("commit", format!("{}{dirty}", info.git_sha));
        self.field("built", info.build_timestamp);
        self.field("rustc", info.rustc_version);
        self.field("target", info.target);
    }
}
