//! Partitioning of fetched packs by their recorded validity.

use serde::Serialize;

use crate::pack::StickerPack;

/// Health of a pack according to its stored validity markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackHealth {
    Valid,
    /// No usable sticker: the pack is empty or every sticker is flagged.
    Invalid,
    /// Usable, but at least one sticker is flagged.
    ValidWithInvalidStickers,
}

/// Classify from markers only; nothing is re-validated.
pub fn classify(pack: &StickerPack) -> PackHealth {
    let invalid = pack.invalid_stickers().count();
    if pack.stickers.is_empty() || invalid == pack.stickers.len() {
        PackHealth::Invalid
    } else if invalid > 0 {
        PackHealth::ValidWithInvalidStickers
    } else {
        PackHealth::Valid
    }
}

/// Every stored pack, split three ways.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchedPacks {
    pub valid: Vec<StickerPack>,
    pub invalid: Vec<StickerPack>,
    pub with_invalid_stickers: Vec<StickerPack>,
}

impl FetchedPacks {
    pub fn partition(packs: impl IntoIterator<Item = StickerPack>) -> Self {
        let mut out = Self::default();
        for pack in packs {
            match classify(&pack) {
                PackHealth::Valid => out.valid.push(pack),
                PackHealth::Invalid => out.invalid.push(pack),
                PackHealth::ValidWithInvalidStickers => out.with_invalid_stickers.push(pack),
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len() + self.with_invalid_stickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All packs with their health.
    pub fn iter(&self) -> impl Iterator<Item = (PackHealth, &StickerPack)> {
        self.valid
            .iter()
            .map(|p| (PackHealth::Valid, p))
            .chain(
                self.with_invalid_stickers
                    .iter()
                    .map(|p| (PackHealth::ValidWithInvalidStickers, p)),
            )
            .chain(self.invalid.iter().map(|p| (PackHealth::Invalid, p)))
    }

    pub fn find(&self, identifier: &str) -> Option<(PackHealth, &StickerPack)> {
        self.iter().find(|(_, p)| p.identifier == identifier)
    }
}
