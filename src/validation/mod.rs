//! Validation engine for sticker packs.
//!
//! Rules run in a fixed order and the first violation wins:
//!
//! 1. identifier, name, publisher, tray image name
//! 2. android / ios store links, license, privacy and publisher websites, email
//! 3. tray image file (present, size, dimensions)
//! 4. sticker count
//! 5. each sticker in order: file name, emoji, accessibility text, then the file itself
//!
//! Validation never writes. Callers decide whether a failure rejects the
//! write or is recorded as a sticker's validity marker.

pub mod media;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::pack::{
    MAX_IDENTIFIER_LEN, MAX_NAME_LEN, MAX_PUBLISHER_LEN, MediaKind, PackLinks, Sticker,
    StickerPack,
};
use crate::store::AssetStore;
use media::{inspect_still, inspect_webp};
use rules::{
    ANDROID_STORE_HOST, IOS_STORE_HOST, char_len, is_store_link, is_valid_email,
    is_valid_identifier_charset, is_valid_web_url,
};

/// Closed set of validation failure codes. The token of a sticker-level
/// code is what gets stored in `validity_marker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    InvalidIdentifier,
    InvalidName,
    InvalidPublisher,
    InvalidTrayImage,
    InvalidAndroidUrl,
    InvalidIosUrl,
    InvalidWebsite,
    InvalidEmail,
    InvalidPackSize,
    InvalidStickerPath,
    InvalidEmoji,
    InvalidAccessibility,
    FileSize,
    StickerDimensions,
    StickerType,
    StickerDuration,
    FileType,
}

impl ValidationCode {
    pub const ALL: [Self; 17] = [
        Self::InvalidIdentifier,
        Self::InvalidName,
        Self::InvalidPublisher,
        Self::InvalidTrayImage,
        Self::InvalidAndroidUrl,
        Self::InvalidIosUrl,
        Self::InvalidWebsite,
        Self::InvalidEmail,
        Self::InvalidPackSize,
        Self::InvalidStickerPath,
        Self::InvalidEmoji,
        Self::InvalidAccessibility,
        Self::FileSize,
        Self::StickerDimensions,
        Self::StickerType,
        Self::StickerDuration,
        Self::FileType,
    ];

    /// Wire token for this code.
    pub const fn token(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::InvalidName => "INVALID_STICKERPACK_NAME",
            Self::InvalidPublisher => "INVALID_PUBLISHER",
            Self::InvalidTrayImage => "INVALID_THUMBNAIL",
            Self::InvalidAndroidUrl => "INVALID_ANDROID_URL_SITE",
            Self::InvalidIosUrl => "INVALID_IOS_URL_SITE",
            Self::InvalidWebsite => "INVALID_WEBSITE",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidPackSize => "INVALID_STICKERPACK_SIZE",
            Self::InvalidStickerPath => "INVALID_STICKER_PATH",
            Self::InvalidEmoji => "INVALID_EMOJI",
            Self::InvalidAccessibility => "INVALID_STICKER_ACCESSIBILITY",
            Self::FileSize => "ERROR_FILE_SIZE",
            Self::StickerDimensions => "ERROR_SIZE_STICKER",
            Self::StickerType => "ERROR_STICKER_TYPE",
            Self::StickerDuration => "ERROR_STICKER_DURATION",
            Self::FileType => "ERROR_FILE_TYPE",
        }
    }

    /// Faults of a sticker's file rather than of its annotations. These are
    /// recorded as validity markers instead of rejecting a save.
    pub const fn is_asset_fault(self) -> bool {
        matches!(
            self,
            Self::InvalidStickerPath
                | Self::FileSize
                | Self::StickerDimensions
                | Self::StickerType
                | Self::StickerDuration
                | Self::FileType
        )
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for ValidationCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl FromStr for ValidationCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.token() == s)
            .ok_or_else(|| format!("unknown validation code '{s}'"))
    }
}

/// The first rule a pack or sticker violated.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{code}: {message} (field: {offending_field})")]
pub struct ValidationFailure {
    pub code: ValidationCode,
    pub offending_field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(
        code: ValidationCode,
        offending_field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            offending_field: offending_field.into(),
            message: message.into(),
        }
    }
}

type Check<T = ()> = Result<T, ValidationFailure>;

/// Every numeric bound the rules use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub min_pack_size: usize,
    pub max_pack_size: usize,
    pub tray_max_bytes: u64,
    pub tray_min_dimension: u32,
    pub tray_max_dimension: u32,
    pub static_sticker_max_bytes: u64,
    pub animated_sticker_max_bytes: u64,
    /// Stickers are square images of exactly this many pixels per side.
    pub sticker_dimension: u32,
    pub min_frame_duration_ms: u32,
    pub max_animation_duration_ms: u64,
    pub static_accessibility_max_chars: usize,
    pub animated_accessibility_max_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_pack_size: 3,
            max_pack_size: 30,
            tray_max_bytes: 50 * 1024,
            tray_min_dimension: 24,
            tray_max_dimension: 512,
            static_sticker_max_bytes: 100 * 1024,
            animated_sticker_max_bytes: 500 * 1024,
            sticker_dimension: 512,
            min_frame_duration_ms: 8,
            max_animation_duration_ms: 10_000,
            static_accessibility_max_chars: 125,
            animated_accessibility_max_chars: 255,
        }
    }
}

impl Limits {
    pub const fn sticker_max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Static => self.static_sticker_max_bytes,
            MediaKind::Animated => self.animated_sticker_max_bytes,
        }
    }

    pub const fn accessibility_max_chars(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Static => self.static_accessibility_max_chars,
            MediaKind::Animated => self.animated_accessibility_max_chars,
        }
    }
}

/// Full result of checking a pack without stopping at the first sticker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Pack-level failure, if any.
    pub pack: Option<ValidationFailure>,
    /// Per-sticker failures keyed by file name, in sticker order.
    pub stickers: Vec<(String, ValidationFailure)>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.pack.is_none() && self.stickers.is_empty()
    }

    /// The failure a first-violation-wins pass would report.
    pub fn first(&self) -> Option<&ValidationFailure> {
        self.pack
            .as_ref()
            .or_else(|| self.stickers.first().map(|(_, f)| f))
    }
}

/// Applies [`Limits`] to packs and their files.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: Limits,
    assets: AssetStore,
}

impl Validator {
    pub fn new(limits: Limits, assets: AssetStore) -> Self {
        Self { limits, assets }
    }

    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    pub const fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Every rule, in order; the first violation wins.
    pub fn validate_pack(&self, pack: &StickerPack) -> Check {
        self.check_pack_fields(pack)?;
        self.check_tray_image(pack)?;
        self.check_pack_size(pack.stickers.len())?;
        for (i, sticker) in pack.stickers.iter().enumerate() {
            check_unique_file_name(&pack.stickers[..i], sticker)?;
            self.validate_sticker(&pack.identifier, sticker, pack.media_kind())?;
        }
        Ok(())
    }

    /// Pack checks, then every sticker, collecting one failure per sticker.
    pub fn report(&self, pack: &StickerPack) -> ValidationReport {
        let pack_failure = self
            .check_pack_fields(pack)
            .and_then(|()| self.check_tray_image(pack))
            .and_then(|()| self.check_pack_size(pack.stickers.len()))
            .err();
        let stickers = pack
            .stickers
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                check_unique_file_name(&pack.stickers[..i], s)
                    .and_then(|()| self.validate_sticker(&pack.identifier, s, pack.media_kind()).map(drop))
                    .err()
                    .map(|f| (s.file_name.clone(), f))
            })
            .collect();
        ValidationReport {
            pack: pack_failure,
            stickers,
        }
    }

    /// Field rules that need no file access.
    pub fn check_pack_fields(&self, pack: &StickerPack) -> Check {
        check_identifier(&pack.identifier)?;
        check_name(&pack.name)?;
        check_publisher(&pack.publisher)?;
        if pack.tray_image.trim().is_empty() {
            return Err(ValidationFailure::new(
                ValidationCode::InvalidTrayImage,
                "tray_image",
                "tray image is required",
            ));
        }
        check_links(&pack.links())
    }

    /// Display name rule, exposed for updates.
    pub fn check_name(&self, name: &str) -> Check {
        check_name(name)
    }

    /// Link and email rules, exposed for updates.
    pub fn check_links(&self, links: &PackLinks) -> Check {
        check_links(links)
    }

    pub fn check_pack_size(&self, count: usize) -> Check {
        let (min, max) = (self.limits.min_pack_size, self.limits.max_pack_size);
        if (min..=max).contains(&count) {
            Ok(())
        } else {
            Err(ValidationFailure::new(
                ValidationCode::InvalidPackSize,
                "stickers",
                format!("pack has {count} stickers, expected between {min} and {max}"),
            ))
        }
    }

    /// Tray icon: present, small enough, dimensions in range.
    pub fn check_tray_image(&self, pack: &StickerPack) -> Check {
        let fail = |message: String| {
            ValidationFailure::new(ValidationCode::InvalidTrayImage, "tray_image", message)
        };
        let size = self
            .assets
            .size_of(&pack.identifier, &pack.tray_image)
            .map_err(|e| fail(e.to_string()))?
            .ok_or_else(|| fail(format!("tray image '{}' not found", pack.tray_image)))?;
        if size > self.limits.tray_max_bytes {
            return Err(fail(format!(
                "tray image is {size} bytes, limit is {}",
                self.limits.tray_max_bytes
            )));
        }
        let bytes = self
            .assets
            .read(&pack.identifier, &pack.tray_image)
            .map_err(|e| fail(e.to_string()))?;
        let info = inspect_still(&bytes).map_err(|e| fail(format!("tray image unreadable: {e}")))?;
        let range = self.limits.tray_min_dimension..=self.limits.tray_max_dimension;
        if !range.contains(&info.width) || !range.contains(&info.height) {
            return Err(fail(format!(
                "tray image is {}x{}, each side must be between {} and {}",
                info.width, info.height, self.limits.tray_min_dimension, self.limits.tray_max_dimension
            )));
        }
        trace!(identifier = %pack.identifier, size, "Tray image ok");
        Ok(())
    }

    /// Annotation rules of one sticker.
    pub fn check_sticker_fields(&self, sticker: &Sticker, kind: MediaKind) -> Check {
        check_sticker_file_name(&sticker.file_name)?;
        if sticker.emojis.iter().all(|e| e.trim().is_empty()) {
            return Err(ValidationFailure::new(
                ValidationCode::InvalidEmoji,
                format!("stickers[{}].emojis", sticker.file_name),
                "at least one emoji is required",
            ));
        }
        let text_len = char_len(sticker.accessibility_text.trim());
        let max = self.limits.accessibility_max_chars(kind);
        if text_len == 0 || text_len > max {
            return Err(ValidationFailure::new(
                ValidationCode::InvalidAccessibility,
                format!("stickers[{}].accessibility_text", sticker.file_name),
                format!("accessibility text must be 1 to {max} characters, got {text_len}"),
            ));
        }
        Ok(())
    }

    /// File rules of one sticker. Returns the file size on success.
    pub fn check_sticker_file(&self, pack_identifier: &str, file_name: &str, kind: MediaKind) -> Check<u64> {
        let field = || format!("stickers[{file_name}]");
        let fail =
            |code: ValidationCode, message: String| ValidationFailure::new(code, field(), message);

        let size = self
            .assets
            .size_of(pack_identifier, file_name)
            .map_err(|e| fail(ValidationCode::InvalidStickerPath, e.to_string()))?
            .ok_or_else(|| {
                fail(
                    ValidationCode::InvalidStickerPath,
                    format!("sticker file '{file_name}' not found"),
                )
            })?;

        let max_bytes = self.limits.sticker_max_bytes(kind);
        if size > max_bytes {
            return Err(fail(
                ValidationCode::FileSize,
                format!("{kind} sticker is {size} bytes, limit is {max_bytes}"),
            ));
        }

        let bytes = self
            .assets
            .read(pack_identifier, file_name)
            .map_err(|e| fail(ValidationCode::InvalidStickerPath, e.to_string()))?;
        let info = inspect_webp(&bytes)
            .map_err(|e| fail(ValidationCode::FileType, format!("not a readable WebP image: {e}")))?;

        let side = self.limits.sticker_dimension;
        if info.width != side || info.height != side {
            return Err(fail(
                ValidationCode::StickerDimensions,
                format!("sticker is {}x{}, expected {side}x{side}", info.width, info.height),
            ));
        }

        if info.is_animated() != kind.is_animated() {
            let actual = MediaKind::from_animated(info.is_animated());
            return Err(fail(
                ValidationCode::StickerType,
                format!("{actual} sticker in a {kind} pack"),
            ));
        }

        if kind.is_animated() {
            if let Some(shortest) = info.shortest_frame_ms() {
                if shortest < self.limits.min_frame_duration_ms {
                    return Err(fail(
                        ValidationCode::StickerDuration,
                        format!(
                            "frame lasts {shortest} ms, minimum is {} ms",
                            self.limits.min_frame_duration_ms
                        ),
                    ));
                }
            }
            let total = info.total_duration_ms();
            if total > self.limits.max_animation_duration_ms {
                return Err(fail(
                    ValidationCode::StickerDuration,
                    format!(
                        "animation lasts {total} ms, maximum is {} ms",
                        self.limits.max_animation_duration_ms
                    ),
                ));
            }
        }

        debug!(pack_identifier, file_name, size, frames = info.frame_count(), "Sticker file ok");
        Ok(size)
    }

    /// Annotation rules, then file rules.
    pub fn validate_sticker(&self, pack_identifier: &str, sticker: &Sticker, kind: MediaKind) -> Check<u64> {
        self.check_sticker_fields(sticker, kind)?;
        self.check_sticker_file(pack_identifier, &sticker.file_name, kind)
    }
}

fn check_identifier(identifier: &str) -> Check {
    let len = char_len(identifier);
    if identifier.trim().is_empty() || len > MAX_IDENTIFIER_LEN {
        return Err(ValidationFailure::new(
            ValidationCode::InvalidIdentifier,
            "identifier",
            format!("identifier must be 1 to {MAX_IDENTIFIER_LEN} characters, got {len}"),
        ));
    }
    if !is_valid_identifier_charset(identifier) {
        return Err(ValidationFailure::new(
            ValidationCode::InvalidIdentifier,
            "identifier",
            "identifier may only contain letters, digits, '_', '-', '.', ',', ''' and spaces, and no '..'",
        ));
    }
    Ok(())
}

fn check_name(name: &str) -> Check {
    let len = char_len(name);
    if name.trim().is_empty() || len > MAX_NAME_LEN {
        return Err(ValidationFailure::new(
            ValidationCode::InvalidName,
            "name",
            format!("name must be 1 to {MAX_NAME_LEN} characters, got {len}"),
        ));
    }
    Ok(())
}

fn check_publisher(publisher: &str) -> Check {
    let len = char_len(publisher);
    if publisher.trim().is_empty() || len > MAX_PUBLISHER_LEN {
        return Err(ValidationFailure::new(
            ValidationCode::InvalidPublisher,
            "publisher",
            format!("publisher must be 1 to {MAX_PUBLISHER_LEN} characters, got {len}"),
        ));
    }
    Ok(())
}

/// A file name may appear once per pack. `earlier` holds the stickers
/// listed before `sticker`, so the repeated listing is the one reported.
pub fn check_unique_file_name(earlier: &[Sticker], sticker: &Sticker) -> Check {
    if earlier.iter().any(|s| s.file_name == sticker.file_name) {
        return Err(ValidationFailure::new(
            ValidationCode::InvalidStickerPath,
            format!("stickers[{}]", sticker.file_name),
            format!("sticker file '{}' is listed more than once", sticker.file_name),
        ));
    }
    Ok(())
}

/// File names become path segments under the pack directory.
pub(crate) fn check_sticker_file_name(file_name: &str) -> Check {
    if crate::store::is_safe_segment(file_name) && !file_name.trim().is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::new(
            ValidationCode::InvalidStickerPath,
            "file_name",
            format!("'{file_name}' is not a valid sticker file name"),
        ))
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn check_links(links: &PackLinks) -> Check {
    if let Some(link) = present(links.android_store_link.as_ref()) {
        if !is_store_link(link, ANDROID_STORE_HOST) {
            return Err(ValidationFailure::new(
                ValidationCode::InvalidAndroidUrl,
                "android_store_link",
                format!("'{link}' is not an http(s) link to {ANDROID_STORE_HOST}"),
            ));
        }
    }
    if let Some(link) = present(links.ios_store_link.as_ref()) {
        if !is_store_link(link, IOS_STORE_HOST) {
            return Err(ValidationFailure::new(
                ValidationCode::InvalidIosUrl,
                "ios_store_link",
                format!("'{link}' is not an http(s) link to {IOS_STORE_HOST}"),
            ));
        }
    }
    let websites = [
        ("license_agreement_website", &links.license_agreement_website),
        ("privacy_policy_website", &links.privacy_policy_website),
        ("publisher_website", &links.publisher_website),
    ];
    for (field, value) in websites {
        if let Some(url) = present(value.as_ref()) {
            if !is_valid_web_url(url) {
                return Err(ValidationFailure::new(
                    ValidationCode::InvalidWebsite,
                    field,
                    format!("'{url}' is not a well-formed http(s) URL"),
                ));
            }
        }
    }
    if let Some(email) = present(links.publisher_email.as_ref()) {
        if !is_valid_email(email) {
            return Err(ValidationFailure::new(
                ValidationCode::InvalidEmail,
                "publisher_email",
                format!("'{email}' is not a valid email address"),
            ));
        }
    }
    Ok(())
}
