//! Persistence orchestrator.
//!
//! [`StickerService`] is the only writer of the sticker tables. Every
//! operation returns an [`Outcome`]; storage errors never escape as panics or
//! raw `rusqlite` errors. Mutations run in one transaction each.
//!
//! Asset files are handled by separate calls ([`StickerService::delete_pack_assets`],
//! [`StickerService::delete_sticker_asset`]); deleting rows leaves files in place.

mod fetch;
pub mod worker;

use std::sync::Arc;

use rusqlite::Transaction;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, StickerError};
use crate::outcome::Outcome;
use crate::pack::{MediaKind, PackLinks, Sticker, StickerPack};
use crate::store::{AssetStore, StickerDb, repo};
use crate::validation::{
    Limits, ValidationCode, ValidationFailure, ValidationReport, Validator,
    check_sticker_file_name, check_unique_file_name,
};

pub use fetch::{FetchedPacks, PackHealth, classify};
pub use worker::{PendingWrite, WritePool};

/// Result of an update that reached its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Updated,
    /// The stored value already matched the request.
    Unchanged,
}

/// Marker changes written by [`StickerService::revalidate_pack`].
#[derive(Debug, Clone, Serialize)]
pub struct Revalidation {
    pub identifier: String,
    pub health: PackHealth,
    pub report: ValidationReport,
    /// `(file_name, new_marker)` for every sticker whose marker changed.
    pub changed: Vec<(String, String)>,
}

/// Save, update, delete and fetch over one [`StickerDb`].
#[derive(Debug, Clone)]
pub struct StickerService {
    db: Arc<StickerDb>,
    validator: Validator,
}

fn not_found(identifier: &str) -> String {
    format!("sticker pack '{identifier}' not found")
}

impl StickerService {
    pub fn new(db: Arc<StickerDb>, assets: AssetStore, limits: Limits) -> Self {
        Self {
            db,
            validator: Validator::new(limits, assets),
        }
    }

    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    pub const fn assets(&self) -> &AssetStore {
        self.validator.assets()
    }

    pub fn db(&self) -> &Arc<StickerDb> {
        &self.db
    }

    // === Save ===

    /// Validate and persist a new pack with all its stickers in one
    /// transaction.
    ///
    /// Pack rules and sticker annotation rules reject the save. Faults in a
    /// sticker's file only set that sticker's validity marker.
    #[instrument(skip(self, pack), fields(identifier = %pack.identifier, stickers = pack.stickers.len()))]
    pub fn save_pack(&self, mut pack: StickerPack) -> Outcome<StickerPack> {
        if let Err(failure) = self.prepare_new_pack(&mut pack) {
            warn!(code = %failure.code, field = %failure.offending_field, "Pack rejected");
            return Outcome::Failure(failure.into());
        }

        let result = self.db.open_for_write().and_then(|handle| {
            handle.transaction(|tx| {
                repo::insert_pack(tx, &pack)?;
                for sticker in &pack.stickers {
                    repo::insert_sticker(tx, sticker)?;
                }
                Ok(())
            })
        });

        match result {
            Ok(()) => {
                info!(
                    total_size = pack.total_size(),
                    invalid = pack.invalid_stickers().count(),
                    "Sticker pack saved"
                );
                Outcome::Success(pack)
            }
            Err(e) => {
                error!(error = %e, "Sticker pack save rolled back");
                Outcome::Failure(e)
            }
        }
    }

    fn prepare_new_pack(&self, pack: &mut StickerPack) -> std::result::Result<(), ValidationFailure> {
        let v = &self.validator;
        v.check_pack_fields(pack)?;
        v.check_tray_image(pack)?;
        v.check_pack_size(pack.stickers.len())?;
        let kind = pack.media_kind();
        for (i, sticker) in pack.stickers.iter().enumerate() {
            check_unique_file_name(&pack.stickers[..i], sticker)?;
            v.check_sticker_fields(sticker, kind)?;
        }
        let identifier = pack.identifier.clone();
        for sticker in &mut pack.stickers {
            sticker.pack_identifier.clone_from(&identifier);
            self.mark_from_file(&identifier, sticker, kind);
        }
        Ok(())
    }

    /// Record the file check result on the sticker and fill its size.
    fn mark_from_file(&self, identifier: &str, sticker: &mut Sticker, kind: MediaKind) {
        match self.validator.check_sticker_file(identifier, &sticker.file_name, kind) {
            Ok(size) => {
                sticker.byte_size = size;
                sticker.validity_marker.clear();
            }
            Err(failure) => {
                warn!(
                    file_name = %sticker.file_name,
                    code = %failure.code,
                    reason = %failure.message,
                    "Sticker flagged invalid"
                );
                sticker.validity_marker = failure.code.token().to_string();
                sticker.byte_size = self.file_size(identifier, &sticker.file_name);
            }
        }
    }

    fn file_size(&self, identifier: &str, file_name: &str) -> u64 {
        self.assets()
            .size_of(identifier, file_name)
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    /// Append stickers to an existing pack. File names already in the pack
    /// are skipped.
    ///
    /// File checks run first. The duplicate filter, the size limit, the
    /// inserts and the version bump then run against the pack as read inside
    /// one transaction.
    #[instrument(skip(self, stickers), fields(count = stickers.len()))]
    pub fn add_stickers(&self, identifier: &str, stickers: Vec<Sticker>) -> Outcome<StickerPack> {
        let handle = match self.db.open_for_write() {
            Ok(h) => h,
            Err(e) => return Outcome::Failure(e),
        };
        let kind = match handle.with_conn(|c| repo::select_pack(c, identifier)) {
            Ok(Some(pack)) => pack.media_kind(),
            Ok(None) => return Outcome::Warning(not_found(identifier)),
            Err(e) => return Outcome::Failure(e),
        };

        let mut candidates: Vec<Sticker> = Vec::with_capacity(stickers.len());
        for mut sticker in stickers {
            if candidates.iter().any(|s| s.file_name == sticker.file_name) {
                debug!(file_name = %sticker.file_name, "Sticker listed twice, skipping");
                continue;
            }
            sticker.pack_identifier = identifier.to_string();
            if let Err(failure) = self.validator.check_sticker_fields(&sticker, kind) {
                return Outcome::Warning(failure.to_string());
            }
            self.mark_from_file(identifier, &mut sticker, kind);
            candidates.push(sticker);
        }

        let max = self.validator.limits().max_pack_size;
        let result = handle.transaction(|tx| {
            let Some(existing) = repo::load_pack(tx, identifier)? else {
                return Ok(Outcome::Warning(not_found(identifier)));
            };
            let fresh: Vec<&Sticker> = candidates
                .iter()
                .filter(|s| {
                    let known = existing.sticker(&s.file_name).is_some();
                    if known {
                        debug!(file_name = %s.file_name, "Sticker already in pack, skipping");
                    }
                    !known
                })
                .collect();
            if fresh.is_empty() {
                return Ok(Outcome::Warning(format!("no new stickers for pack '{identifier}'")));
            }
            let total = existing.stickers.len() + fresh.len();
            if total > max {
                return Ok(Outcome::Warning(
                    ValidationFailure::new(
                        ValidationCode::InvalidPackSize,
                        "stickers",
                        format!("pack would hold {total} stickers, maximum is {max}"),
                    )
                    .to_string(),
                ));
            }

            for sticker in &fresh {
                repo::insert_sticker(tx, sticker)?;
            }
            bump_version(tx, identifier)?;
            let pack = repo::load_pack(tx, identifier)?.ok_or_else(|| StickerError::PackNotFound {
                identifier: identifier.to_string(),
            })?;
            info!(identifier, added = fresh.len(), "Stickers appended");
            Ok(Outcome::Success(pack))
        });
        match result {
            Ok(Outcome::Success(mut pack)) => {
                self.fill_sizes(&mut pack);
                Outcome::Success(pack)
            }
            Ok(other) => other,
            Err(e) => {
                error!(identifier, error = %e, "Sticker append rolled back");
                Outcome::Failure(e)
            }
        }
    }

    // === Update ===

    /// Run `f` on an existing pack inside a transaction. A missing pack is a
    /// Warning.
    fn update_with<F>(&self, identifier: &str, f: F) -> Outcome<UpdateStatus>
    where
        F: FnOnce(&Transaction<'_>, &StickerPack) -> Result<Outcome<UpdateStatus>>,
    {
        let result = self.db.open_for_write().and_then(|handle| {
            handle.transaction(|tx| match repo::select_pack(tx, identifier)? {
                Some(pack) => f(tx, &pack),
                None => Ok(Outcome::Warning(not_found(identifier))),
            })
        });
        match result {
            Ok(outcome) => {
                debug!(identifier, outcome = outcome.kind(), "Update finished");
                outcome
            }
            Err(e) => {
                error!(identifier, error = %e, "Update rolled back");
                Outcome::Failure(e)
            }
        }
    }

    /// Change the display name.
    #[instrument(skip(self))]
    pub fn update_pack_name(&self, identifier: &str, name: &str) -> Outcome<UpdateStatus> {
        if let Err(failure) = self.validator.check_name(name) {
            warn!(code = %failure.code, "Rename rejected");
            return Outcome::Warning(failure.to_string());
        }
        self.update_with(identifier, |tx, pack| {
            if pack.name == name {
                return Ok(Outcome::Success(UpdateStatus::Unchanged));
            }
            repo::update_pack_name(tx, identifier, name)?;
            info!(identifier, name, "Pack renamed");
            Ok(Outcome::Success(UpdateStatus::Updated))
        })
    }

    /// Replace every link field. Passing empty links clears them.
    #[instrument(skip(self, links))]
    pub fn update_pack_links(&self, identifier: &str, links: &PackLinks) -> Outcome<UpdateStatus> {
        if let Err(failure) = self.validator.check_links(links) {
            warn!(code = %failure.code, "Link update rejected");
            return Outcome::Warning(failure.to_string());
        }
        self.update_with(identifier, |tx, pack| {
            if pack.links() == *links {
                return Ok(Outcome::Success(UpdateStatus::Unchanged));
            }
            repo::update_pack_links(tx, identifier, links)?;
            info!(identifier, "Pack links updated");
            Ok(Outcome::Success(UpdateStatus::Updated))
        })
    }

    /// Rename one sticker's file reference. Its validity marker is cleared.
    #[instrument(skip(self))]
    pub fn rename_sticker(&self, identifier: &str, old_name: &str, new_name: &str) -> Outcome<UpdateStatus> {
        if let Err(failure) = check_sticker_file_name(new_name) {
            return Outcome::Warning(failure.to_string());
        }
        self.update_with(identifier, |tx, pack| {
            let stickers = repo::select_stickers(tx, identifier)?;
            if !stickers.iter().any(|s| s.file_name == old_name) {
                return Ok(Outcome::Warning(format!(
                    "sticker '{old_name}' not found in pack '{identifier}'"
                )));
            }
            if old_name == new_name {
                return Ok(Outcome::Success(UpdateStatus::Unchanged));
            }
            if stickers.iter().any(|s| s.file_name == new_name) {
                return Ok(Outcome::Warning(format!(
                    "sticker '{new_name}' already exists in pack '{identifier}'"
                )));
            }
            repo::update_sticker_file_name(tx, identifier, old_name, new_name)?;
            bump_version(tx, identifier)?;
            info!(identifier, old_name, new_name, "Sticker renamed");
            Ok(Outcome::Success(UpdateStatus::Updated))
        })
    }

    /// Set or clear one sticker's validity marker.
    #[instrument(skip(self))]
    pub fn mark_sticker(
        &self,
        identifier: &str,
        file_name: &str,
        code: Option<ValidationCode>,
    ) -> Outcome<UpdateStatus> {
        let marker = code.map_or("", ValidationCode::token);
        self.update_with(identifier, |tx, _| {
            let stickers = repo::select_stickers(tx, identifier)?;
            let Some(sticker) = stickers.iter().find(|s| s.file_name == file_name) else {
                return Ok(Outcome::Warning(format!(
                    "sticker '{file_name}' not found in pack '{identifier}'"
                )));
            };
            if sticker.validity_marker == marker {
                return Ok(Outcome::Success(UpdateStatus::Unchanged));
            }
            repo::update_validity_marker(tx, identifier, file_name, marker)?;
            Ok(Outcome::Success(UpdateStatus::Updated))
        })
    }

    // === Delete ===

    /// Delete a pack row and, through the cascade, its sticker rows.
    /// Returns the total number of rows removed.
    #[instrument(skip(self))]
    pub fn delete_pack(&self, identifier: &str) -> Outcome<usize> {
        let result = self.db.open_for_write().and_then(|handle| {
            handle.transaction(|tx| {
                let stickers = repo::count_stickers(tx, identifier)?;
                let packs = repo::delete_pack(tx, identifier)?;
                Ok(if packs == 0 { 0 } else { packs + stickers })
            })
        });
        match result {
            Ok(0) => {
                warn!(identifier, "No rows deleted");
                Outcome::Warning(format!("no rows deleted: {}", not_found(identifier)))
            }
            Ok(rows) => {
                info!(identifier, rows, "Sticker pack deleted");
                Outcome::Success(rows)
            }
            Err(e) => Outcome::Failure(e),
        }
    }

    /// Delete a single sticker row.
    #[instrument(skip(self))]
    pub fn delete_sticker(&self, identifier: &str, file_name: &str) -> Outcome<usize> {
        let result = self.db.open_for_write().and_then(|handle| {
            handle.transaction(|tx| {
                let rows = repo::delete_sticker(tx, identifier, file_name)?;
                if rows > 0 {
                    bump_version(tx, identifier)?;
                }
                Ok(rows)
            })
        });
        match result {
            Ok(0) => {
                warn!(identifier, file_name, "No rows deleted");
                Outcome::Warning(format!(
                    "no rows deleted: sticker '{file_name}' not found in pack '{identifier}'"
                ))
            }
            Ok(rows) => {
                info!(identifier, file_name, "Sticker deleted");
                Outcome::Success(rows)
            }
            Err(e) => Outcome::Failure(e),
        }
    }

    /// Remove a pack's asset directory. Independent of [`Self::delete_pack`].
    pub fn delete_pack_assets(&self, identifier: &str) -> Outcome<usize> {
        self.assets().delete_pack_assets(identifier)
    }

    /// Remove one asset file. Independent of [`Self::delete_sticker`].
    pub fn delete_sticker_asset(&self, identifier: &str, file_name: &str) -> Outcome<std::path::PathBuf> {
        self.assets().delete_asset(identifier, file_name)
    }

    // === Fetch ===

    /// Every pack with stickers and sizes, partitioned by stored markers.
    #[instrument(skip(self))]
    pub fn fetch_packs(&self) -> Outcome<FetchedPacks> {
        let packs = self
            .db
            .open_for_read()
            .and_then(|handle| handle.with_conn(repo::load_packs));
        match packs {
            Ok(mut packs) => {
                for pack in &mut packs {
                    self.fill_sizes(pack);
                }
                let fetched = FetchedPacks::partition(packs);
                debug!(
                    valid = fetched.valid.len(),
                    invalid = fetched.invalid.len(),
                    with_invalid_stickers = fetched.with_invalid_stickers.len(),
                    "Fetched sticker packs"
                );
                Outcome::Success(fetched)
            }
            Err(e) => Outcome::Failure(e),
        }
    }

    /// One pack with stickers and sizes.
    #[instrument(skip(self))]
    pub fn fetch_pack(&self, identifier: &str) -> Outcome<StickerPack> {
        let pack = self
            .db
            .open_for_read()
            .and_then(|handle| handle.with_conn(|c| repo::load_pack(c, identifier)));
        match pack {
            Ok(Some(mut pack)) => {
                self.fill_sizes(&mut pack);
                Outcome::Success(pack)
            }
            Ok(None) => Outcome::Warning(not_found(identifier)),
            Err(e) => Outcome::Failure(e),
        }
    }

    fn fill_sizes(&self, pack: &mut StickerPack) {
        let identifier = pack.identifier.clone();
        for sticker in &mut pack.stickers {
            sticker.byte_size = self.file_size(&identifier, &sticker.file_name);
        }
    }

    /// Re-run validation on a stored pack and persist marker changes. No
    /// other column is touched.
    ///
    /// Files are checked against a snapshot. Markers are compared and
    /// written against the rows as read inside the write transaction.
    /// Stickers added or renamed since the snapshot are left alone.
    #[instrument(skip(self))]
    pub fn revalidate_pack(&self, identifier: &str) -> Outcome<Revalidation> {
        let snapshot = match self.fetch_pack(identifier) {
            Outcome::Success(pack) => pack,
            Outcome::Warning(m) => return Outcome::Warning(m),
            Outcome::Debug(m) => return Outcome::Debug(m),
            Outcome::Failure(e) => return Outcome::Failure(e),
        };
        let report = self.validator.report(&snapshot);
        let checked: Vec<(&str, &str)> = snapshot
            .stickers
            .iter()
            .map(|sticker| {
                let marker = report
                    .stickers
                    .iter()
                    .find(|(file, _)| *file == sticker.file_name)
                    .map_or("", |(_, f)| f.code.token());
                (sticker.file_name.as_str(), marker)
            })
            .collect();

        let written = self.db.open_for_write().and_then(|handle| {
            handle.transaction(|tx| {
                let Some(mut pack) = repo::load_pack(tx, identifier)? else {
                    return Ok(None);
                };
                let mut changed = Vec::new();
                for sticker in &mut pack.stickers {
                    let Some((_, marker)) = checked.iter().find(|(file, _)| *file == sticker.file_name) else {
                        continue;
                    };
                    if sticker.validity_marker != *marker {
                        repo::update_validity_marker(tx, identifier, &sticker.file_name, marker)?;
                        sticker.validity_marker = (*marker).to_string();
                        changed.push((sticker.file_name.clone(), (*marker).to_string()));
                    }
                }
                Ok(Some((pack, changed)))
            })
        });
        let (pack, changed) = match written {
            Ok(Some(found)) => found,
            Ok(None) => return Outcome::Warning(not_found(identifier)),
            Err(e) => return Outcome::Failure(e),
        };

        let health = if report.pack.is_some() {
            PackHealth::Invalid
        } else {
            classify(&pack)
        };
        info!(identifier, changed = changed.len(), ?health, "Pack revalidated");
        Outcome::Success(Revalidation {
            identifier: identifier.to_string(),
            health,
            report,
            changed,
        })
    }
}

/// Increment the stored image data version, read inside `tx`.
fn bump_version(tx: &Transaction<'_>, identifier: &str) -> Result<()> {
    let Some(mut pack) = repo::select_pack(tx, identifier)? else {
        return Ok(());
    };
    pack.bump_image_data_version();
    repo::update_image_data_version(tx, identifier, &pack.image_data_version)?;
    Ok(())
}
