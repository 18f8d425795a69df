//! Conversion between domain entities and database rows.
//!
//! A [`Row`] is an ordered list of `(column, value)` cells. Writes build a row
//! with [`pack_to_row`] / [`sticker_to_row`] and insert it column-for-column;
//! reads collect a row from a SQLite result and decode it back, failing with a
//! [`DecodeError`] when a required column is missing or has the wrong type.

use rusqlite::types::Value;
use thiserror::Error;

use crate::pack::{Sticker, StickerPack};

/// Column names of the `sticker_pack` table.
pub mod pack_columns {
    pub const IDENTIFIER: &str = "identifier";
    pub const NAME: &str = "name";
    pub const PUBLISHER: &str = "publisher";
    pub const TRAY_IMAGE: &str = "tray_image";
    pub const PUBLISHER_EMAIL: &str = "publisher_email";
    pub const PUBLISHER_WEBSITE: &str = "publisher_website";
    pub const PRIVACY_POLICY_WEBSITE: &str = "privacy_policy_website";
    pub const LICENSE_AGREEMENT_WEBSITE: &str = "license_agreement_website";
    pub const ANDROID_STORE_LINK: &str = "android_store_link";
    pub const IOS_STORE_LINK: &str = "ios_store_link";
    pub const IMAGE_DATA_VERSION: &str = "image_data_version";
    pub const AVOID_CACHE: &str = "avoid_cache";
    pub const ANIMATED: &str = "animated";

    /// Every persisted pack column, in table order.
    pub const ALL: [&str; 13] = [
        IDENTIFIER,
        NAME,
        PUBLISHER,
        TRAY_IMAGE,
        PUBLISHER_EMAIL,
        PUBLISHER_WEBSITE,
        PRIVACY_POLICY_WEBSITE,
        LICENSE_AGREEMENT_WEBSITE,
        ANDROID_STORE_LINK,
        IOS_STORE_LINK,
        IMAGE_DATA_VERSION,
        AVOID_CACHE,
        ANIMATED,
    ];
}

/// Column names of the `sticker` table (excluding the surrogate key).
pub mod sticker_columns {
    pub const PACK_IDENTIFIER: &str = "pack_identifier";
    pub const FILE_NAME: &str = "file_name";
    pub const EMOJIS: &str = "emojis";
    pub const ACCESSIBILITY_TEXT: &str = "accessibility_text";
    pub const VALIDITY_MARKER: &str = "validity_marker";

    pub const ALL: [&str; 5] = [
        PACK_IDENTIFIER,
        FILE_NAME,
        EMOJIS,
        ACCESSIBILITY_TEXT,
        VALIDITY_MARKER,
    ];
}

/// Separator used to store the emoji list in a single text column.
pub const EMOJI_SEPARATOR: char = ',';

/// Why a stored row could not become an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("required column '{column}' is missing")]
    MissingColumn { column: &'static str },

    #[error("required column '{column}' is NULL")]
    NullColumn { column: &'static str },

    #[error("column '{column}' has type {found}, expected {expected}")]
    WrongType {
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// An ordered set of column values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(&'static str, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell. Columns are expected to be unique.
    pub fn push(&mut self, column: &'static str, value: impl Into<Value>) {
        self.cells.push((column, value.into()));
    }

    /// Builder form of [`Self::push`].
    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.cells.iter().position(|(c, _)| *c == column)?;
        Some(self.cells.remove(idx).1)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.iter().map(|(c, _)| *c)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Collect the named columns, by position, from a SQLite result row.
    pub fn from_sql(row: &rusqlite::Row<'_>, columns: &[&'static str]) -> rusqlite::Result<Self> {
        let mut out = Self {
            cells: Vec::with_capacity(columns.len()),
        };
        for (idx, column) in columns.iter().enumerate() {
            out.cells.push((*column, row.get::<_, Value>(idx)?));
        }
        Ok(out)
    }

    fn required_text(&self, column: &'static str) -> Result<String, DecodeError> {
        match self.get(column) {
            None => Err(DecodeError::MissingColumn { column }),
            Some(Value::Null) => Err(DecodeError::NullColumn { column }),
            Some(Value::Text(s)) => Ok(s.clone()),
            Some(other) => Err(wrong_type(column, "TEXT", other)),
        }
    }

    fn optional_text(&self, column: &'static str) -> Result<Option<String>, DecodeError> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(other) => Err(wrong_type(column, "TEXT", other)),
        }
    }

    fn required_flag(&self, column: &'static str) -> Result<bool, DecodeError> {
        match self.get(column) {
            None => Err(DecodeError::MissingColumn { column }),
            Some(Value::Null) => Err(DecodeError::NullColumn { column }),
            Some(Value::Integer(i)) => Ok(*i != 0),
            Some(other) => Err(wrong_type(column, "INTEGER", other)),
        }
    }
}

fn wrong_type(column: &'static str, expected: &'static str, found: &Value) -> DecodeError {
    let found = match found {
        Value::Null => "NULL",
        Value::Integer(_) => "INTEGER",
        Value::Real(_) => "REAL",
        Value::Text(_) => "TEXT",
        Value::Blob(_) => "BLOB",
    };
    DecodeError::WrongType {
        column,
        expected,
        found,
    }
}

fn optional(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.clone()))
}

/// Encode a pack's persisted fields. Stickers are mapped separately.
pub fn pack_to_row(pack: &StickerPack) -> Row {
    use pack_columns::*;
    Row::new()
        .with(IDENTIFIER, pack.identifier.clone())
        .with(NAME, pack.name.clone())
        .with(PUBLISHER, pack.publisher.clone())
        .with(TRAY_IMAGE, pack.tray_image.clone())
        .with(PUBLISHER_EMAIL, optional(pack.publisher_email.as_ref()))
        .with(PUBLISHER_WEBSITE, optional(pack.publisher_website.as_ref()))
        .with(
            PRIVACY_POLICY_WEBSITE,
            optional(pack.privacy_policy_website.as_ref()),
        )
        .with(
            LICENSE_AGREEMENT_WEBSITE,
            optional(pack.license_agreement_website.as_ref()),
        )
        .with(ANDROID_STORE_LINK, optional(pack.android_store_link.as_ref()))
        .with(IOS_STORE_LINK, optional(pack.ios_store_link.as_ref()))
        .with(IMAGE_DATA_VERSION, pack.image_data_version.clone())
        .with(AVOID_CACHE, i64::from(pack.avoid_cache))
        .with(ANIMATED, i64::from(pack.animated))
}

/// Decode a pack row. The returned pack has no stickers.
pub fn row_to_pack(row: &Row) -> Result<StickerPack, DecodeError> {
    use pack_columns::*;
    Ok(StickerPack {
        identifier: row.required_text(IDENTIFIER)?,
        name: row.required_text(NAME)?,
        publisher: row.required_text(PUBLISHER)?,
        tray_image: row.required_text(TRAY_IMAGE)?,
        publisher_email: row.optional_text(PUBLISHER_EMAIL)?,
        publisher_website: row.optional_text(PUBLISHER_WEBSITE)?,
        privacy_policy_website: row.optional_text(PRIVACY_POLICY_WEBSITE)?,
        license_agreement_website: row.optional_text(LICENSE_AGREEMENT_WEBSITE)?,
        android_store_link: row.optional_text(ANDROID_STORE_LINK)?,
        ios_store_link: row.optional_text(IOS_STORE_LINK)?,
        image_data_version: row.required_text(IMAGE_DATA_VERSION)?,
        avoid_cache: row.required_flag(AVOID_CACHE)?,
        animated: row.required_flag(ANIMATED)?,
        stickers: Vec::new(),
        is_whitelisted: false,
    })
}

/// Encode a sticker. `byte_size` is derived from disk and not stored.
pub fn sticker_to_row(sticker: &Sticker) -> Row {
    use sticker_columns::*;
    Row::new()
        .with(PACK_IDENTIFIER, sticker.pack_identifier.clone())
        .with(FILE_NAME, sticker.file_name.clone())
        .with(EMOJIS, join_emojis(&sticker.emojis))
        .with(ACCESSIBILITY_TEXT, sticker.accessibility_text.clone())
        .with(VALIDITY_MARKER, sticker.validity_marker.clone())
}

pub fn row_to_sticker(row: &Row) -> Result<Sticker, DecodeError> {
    use sticker_columns::*;
    Ok(Sticker {
        file_name: row.required_text(FILE_NAME)?,
        emojis: split_emojis(&row.required_text(EMOJIS)?),
        accessibility_text: row.required_text(ACCESSIBILITY_TEXT)?,
        validity_marker: row.optional_text(VALIDITY_MARKER)?.unwrap_or_default(),
        pack_identifier: row.required_text(PACK_IDENTIFIER)?,
        byte_size: 0,
    })
}

fn join_emojis(emojis: &[String]) -> String {
    emojis.join(&EMOJI_SEPARATOR.to_string())
}

fn split_emojis(stored: &str) -> Vec<String> {
    stored
        .split(EMOJI_SEPARATOR)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}
