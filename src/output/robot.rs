//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, trace, warn};

use crate::content::{AssetFile, ResultTable};
use crate::error::StickerError;
use crate::pack::StickerPack;
use crate::service::{FetchedPacks, PackHealth, Revalidation, UpdateStatus};

use super::{DeleteSummary, ImportSummary, Output, RobotFormat, VersionInfo};

/// JSON output for agents and scripting. Results go to stdout, errors to
/// stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                warn!(error = %e, "JSON serialization failed");
                None
            }
        }
    }

    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

#[derive(Serialize)]
struct PackEntry<'a> {
    health: PackHealth,
    #[serde(flatten)]
    pack: &'a StickerPack,
    total_size: u64,
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&json!({ "success": true, "message": message }));
    }

    fn error(&self, error: &StickerError) {
        debug!(error = %error, "Robot: error");
        let code = match error {
            StickerError::Validation(failure) => Some(failure.code.token()),
            _ => None,
        };
        self.output_json_stderr(&json!({
            "error": true,
            "message": error.to_string(),
            "code": code,
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    fn warning(&self, message: &str) {
        self.output_json(&json!({ "warning": true, "message": message }));
    }

    fn info(&self, message: &str) {
        self.output_json(&json!({ "info": true, "message": message }));
    }

    #[instrument(skip(self, summary), fields(identifier = %summary.identifier))]
    fn imported(&self, summary: &ImportSummary) {
        self.output_json(summary);
    }

    #[instrument(skip(self, packs), fields(count = packs.len()))]
    fn pack_list(&self, packs: &FetchedPacks) {
        let entries: Vec<PackEntry<'_>> = packs
            .iter()
            .map(|(health, pack)| PackEntry {
                health,
                pack,
                total_size: pack.total_size(),
            })
            .collect();
        self.output_json(&entries);
    }

    fn pack_detail(&self, pack: &StickerPack, health: PackHealth) {
        self.output_json(&PackEntry {
            health,
            pack,
            total_size: pack.total_size(),
        });
    }

    fn update_status(&self, action: &str, identifier: &str, status: UpdateStatus) {
        self.output_json(&json!({
            "action": action,
            "identifier": identifier,
            "status": status,
        }));
    }

    fn deleted(&self, summary: &DeleteSummary) {
        self.output_json(summary);
    }

    fn revalidation(&self, result: &Revalidation) {
        self.output_json(result);
    }

    fn table(&self, table: &ResultTable) {
        self.output_json(table);
    }

    fn asset(&self, asset: &AssetFile) {
        self.output_json(&json!({
            "identifier": asset.identifier,
            "file_name": asset.file_name,
            "path": asset.path.display().to_string(),
            "mime_type": asset.mime_type,
            "len": asset.len,
        }));
    }

    fn converted(&self, input: &Path, output: &Path) {
        self.output_json(&json!({
            "input": input.display().to_string(),
            "output": output.display().to_string(),
            "ok": true,
        }));
    }

    fn config_written(&self, config_path: &Path, data_dir: &Path) {
        self.output_json(&json!({
            "config": config_path.display().to_string(),
            "data_dir": data_dir.display().to_string(),
            "ok": true,
        }));
    }

    fn version_info(&self, info: &VersionInfo) {
        self.output_json(info);
    }
}
