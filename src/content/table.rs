//! Fixed-column result tables returned by metadata and sticker queries.

use serde::Serialize;

use crate::pack::{Sticker, StickerPack};
use crate::store::mapper::EMOJI_SEPARATOR;

/// Column names as external consumers read them.
pub mod columns {
    pub const PACK_IDENTIFIER: &str = "sticker_pack_identifier";
    pub const PACK_NAME: &str = "sticker_pack_name";
    pub const PACK_PUBLISHER: &str = "sticker_pack_publisher";
    pub const PACK_ICON: &str = "sticker_pack_icon";
    pub const ANDROID_STORE_LINK: &str = "android_play_store_link";
    pub const IOS_STORE_LINK: &str = "ios_app_download_link";
    pub const PUBLISHER_EMAIL: &str = "sticker_pack_publisher_email";
    pub const PUBLISHER_WEBSITE: &str = "sticker_pack_publisher_website";
    pub const PRIVACY_POLICY_WEBSITE: &str = "sticker_pack_privacy_policy_website";
    pub const LICENSE_AGREEMENT_WEBSITE: &str = "sticker_pack_license_agreement_website";
    pub const IMAGE_DATA_VERSION: &str = "image_data_version";
    pub const AVOID_CACHE: &str = "whatsapp_will_not_cache_stickers";
    pub const ANIMATED: &str = "animated_sticker_pack";

    /// Metadata columns in wire order.
    pub const PACK: [&str; 13] = [
        PACK_IDENTIFIER,
        PACK_NAME,
        PACK_PUBLISHER,
        PACK_ICON,
        ANDROID_STORE_LINK,
        IOS_STORE_LINK,
        PUBLISHER_EMAIL,
        PUBLISHER_WEBSITE,
        PRIVACY_POLICY_WEBSITE,
        LICENSE_AGREEMENT_WEBSITE,
        IMAGE_DATA_VERSION,
        AVOID_CACHE,
        ANIMATED,
    ];

    pub const STICKER_FILE_NAME: &str = "sticker_file_name";
    pub const STICKER_EMOJI: &str = "sticker_emoji";
    pub const STICKER_IS_VALID: &str = "sticker_is_valid";
    pub const STICKER_ACCESSIBILITY_TEXT: &str = "sticker_accessibility_text";

    /// Sticker columns in wire order.
    pub const STICKER: [&str; 4] = [
        STICKER_FILE_NAME,
        STICKER_EMOJI,
        STICKER_IS_VALID,
        STICKER_ACCESSIBILITY_TEXT,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&Option<String>> for CellValue {
    fn from(value: &Option<String>) -> Self {
        value.as_deref().map_or(Self::Null, Self::from)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Ordered columns, one row per entity. An empty table still carries its
/// columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    columns: Vec<&'static str>,
    rows: Vec<Vec<CellValue>>,
}

impl ResultTable {
    pub fn new(columns: &[&'static str]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Metadata table for `packs`.
    pub fn packs<'a>(packs: impl IntoIterator<Item = &'a StickerPack>) -> Self {
        let mut table = Self::new(&columns::PACK);
        for pack in packs {
            table.rows.push(vec![
                pack.identifier.as_str().into(),
                pack.name.as_str().into(),
                pack.publisher.as_str().into(),
                pack.tray_image.as_str().into(),
                (&pack.android_store_link).into(),
                (&pack.ios_store_link).into(),
                (&pack.publisher_email).into(),
                (&pack.publisher_website).into(),
                (&pack.privacy_policy_website).into(),
                (&pack.license_agreement_website).into(),
                pack.image_data_version.as_str().into(),
                pack.avoid_cache.into(),
                pack.animated.into(),
            ]);
        }
        table
    }

    /// Sticker table for `stickers`. Emoji are joined with the storage separator.
    pub fn stickers<'a>(stickers: impl IntoIterator<Item = &'a Sticker>) -> Self {
        let mut table = Self::new(&columns::STICKER);
        let separator = EMOJI_SEPARATOR.to_string();
        for sticker in stickers {
            table.rows.push(vec![
                sticker.file_name.as_str().into(),
                CellValue::Text(sticker.emojis.join(&separator)),
                sticker.validity_marker.as_str().into(),
                sticker.accessibility_text.as_str().into(),
            ]);
        }
        table
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` in the named column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.columns.iter().position(|c| *c == column)?;
        self.rows.get(row)?.get(index)
    }
}
