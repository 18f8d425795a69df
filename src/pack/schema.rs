//! Sticker pack and sticker entities.

use serde::{Deserialize, Serialize};

/// Maximum number of characters in a pack identifier.
pub const MAX_IDENTIFIER_LEN: usize = 36;
/// Maximum number of characters in a pack name.
pub const MAX_NAME_LEN: usize = 35;
/// Maximum number of characters in a publisher name.
pub const MAX_PUBLISHER_LEN: usize = 40;

/// Whether a pack holds still or animated stickers. Uniform across the pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Static,
    Animated,
}

impl MediaKind {
    /// Build from the persisted `animated` flag.
    pub const fn from_animated(animated: bool) -> Self {
        if animated { Self::Animated } else { Self::Static }
    }

    pub const fn is_animated(self) -> bool {
        matches!(self, Self::Animated)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Animated => write!(f, "animated"),
        }
    }
}

/// A named, published collection of stickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerPack {
    /// Unique key, at most 36 characters.
    pub identifier: String,
    /// Display name, at most 35 characters.
    pub name: String,
    /// Publisher name, at most 40 characters.
    pub publisher: String,
    /// File name of the tray icon inside the pack's asset directory.
    pub tray_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_agreement_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_store_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_store_link: Option<String>,
    /// Opaque version string; changes whenever the pack's images change.
    pub image_data_version: String,
    /// Tells the consumer not to cache the stickers.
    #[serde(default)]
    pub avoid_cache: bool,
    #[serde(default)]
    pub animated: bool,
    /// Stickers in insertion order.
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    /// Set by the whitelist collaborator, never persisted.
    #[serde(default, skip_deserializing)]
    pub is_whitelisted: bool,
}

impl StickerPack {
    /// Create a pack with the required fields and no stickers.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        publisher: impl Into<String>,
        tray_image: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            publisher: publisher.into(),
            tray_image: tray_image.into(),
            publisher_email: None,
            publisher_website: None,
            privacy_policy_website: None,
            license_agreement_website: None,
            android_store_link: None,
            ios_store_link: None,
            image_data_version: "1".to_string(),
            avoid_cache: false,
            animated: false,
            stickers: Vec::new(),
            is_whitelisted: false,
        }
    }

    /// Mark the pack as animated.
    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// Set the avoid-cache flag.
    pub fn with_avoid_cache(mut self, avoid_cache: bool) -> Self {
        self.avoid_cache = avoid_cache;
        self
    }

    /// Replace every link field at once.
    pub fn with_links(mut self, links: PackLinks) -> Self {
        self.apply_links(links);
        self
    }

    /// Append a sticker, rewriting its pack reference to this pack.
    pub fn add_sticker(&mut self, mut sticker: Sticker) {
        sticker.pack_identifier.clone_from(&self.identifier);
        self.stickers.push(sticker);
    }

    /// Builder form of [`Self::add_sticker`].
    pub fn with_sticker(mut self, sticker: Sticker) -> Self {
        self.add_sticker(sticker);
        self
    }

    pub const fn media_kind(&self) -> MediaKind {
        MediaKind::from_animated(self.animated)
    }

    /// Sum of the stickers' byte sizes.
    pub fn total_size(&self) -> u64 {
        self.stickers.iter().map(|s| s.byte_size).sum()
    }

    /// Look up a sticker by file name.
    pub fn sticker(&self, file_name: &str) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.file_name == file_name)
    }

    /// Stickers whose last validation pass recorded a fault.
    pub fn invalid_stickers(&self) -> impl Iterator<Item = &Sticker> {
        self.stickers.iter().filter(|s| !s.is_valid())
    }

    /// Snapshot of the link fields.
    pub fn links(&self) -> PackLinks {
        PackLinks {
            publisher_email: self.publisher_email.clone(),
            publisher_website: self.publisher_website.clone(),
            privacy_policy_website: self.privacy_policy_website.clone(),
            license_agreement_website: self.license_agreement_website.clone(),
            android_store_link: self.android_store_link.clone(),
            ios_store_link: self.ios_store_link.clone(),
        }
    }

    pub fn apply_links(&mut self, links: PackLinks) {
        self.publisher_email = links.publisher_email;
        self.publisher_website = links.publisher_website;
        self.privacy_policy_website = links.privacy_policy_website;
        self.license_agreement_website = links.license_agreement_website;
        self.android_store_link = links.android_store_link;
        self.ios_store_link = links.ios_store_link;
    }

    /// Advance `image_data_version` so consumers drop cached images.
    pub fn bump_image_data_version(&mut self) {
        self.image_data_version = next_image_data_version(&self.image_data_version);
    }
}

/// Next value of a numeric image data version. Non-numeric versions restart at "1".
pub(crate) fn next_image_data_version(current: &str) -> String {
    current
        .trim()
        .parse::<u64>()
        .map_or_else(|_| "1".to_string(), |v| v.saturating_add(1).to_string())
}

/// The optional contact and store links of a pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_agreement_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_store_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_store_link: Option<String>,
}

impl PackLinks {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single image inside a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    /// File name inside the pack's asset directory; unique within the pack.
    pub file_name: String,
    /// One or more emoji describing the sticker.
    pub emojis: Vec<String>,
    pub accessibility_text: String,
    /// Empty when valid, otherwise the token of the last recorded fault.
    #[serde(default)]
    pub validity_marker: String,
    /// Identifier of the owning pack.
    #[serde(default)]
    pub pack_identifier: String,
    /// Size of the asset file; derived from disk, never persisted.
    #[serde(default)]
    pub byte_size: u64,
}

impl Sticker {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        emojis: Vec<String>,
        accessibility_text: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            emojis,
            accessibility_text: accessibility_text.into(),
            validity_marker: String::new(),
            pack_identifier: String::new(),
            byte_size: 0,
        }
    }

    /// True when no fault is recorded.
    pub fn is_valid(&self) -> bool {
        self.validity_marker.is_empty()
    }
}
