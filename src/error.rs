//! Error types for sticker store operations.

use thiserror::Error;

use crate::convert::ConvertError;
use crate::store::mapper::DecodeError;
use crate::validation::ValidationFailure;

/// Primary error type for sticker store operations.
#[derive(Error, Debug)]
pub enum StickerError {
    // Pack errors
    #[error("Sticker pack not found: {identifier}")]
    PackNotFound { identifier: String },

    #[error("Sticker '{file_name}' not found in pack '{identifier}'")]
    StickerNotFound {
        identifier: String,
        file_name: String,
    },

    #[error("Sticker pack '{identifier}' already exists")]
    DuplicateIdentifier { identifier: String },

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    // Storage errors
    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Stored row could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    // Asset errors
    #[error("Asset file not found: {path}")]
    AssetNotFound { path: String },

    #[error("Asset file already exists: {path}")]
    AssetExists { path: String },

    #[error("Invalid asset name '{name}'")]
    InvalidAssetName { name: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    // Content access errors
    #[error("Content request rejected: {0}")]
    ContentRejected(String),

    // Runtime errors
    #[error("Write worker unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("Web server failed to start on {addr}: {reason}")]
    WebServerFailed { addr: String, reason: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl StickerError {
    /// Wraps a SQLite error with the name of the operation that produced it.
    pub const fn storage(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Storage { operation, source }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PackNotFound { .. }
                | Self::StickerNotFound { .. }
                | Self::DuplicateIdentifier { .. }
                | Self::Validation(_)
                | Self::AssetNotFound { .. }
                | Self::AssetExists { .. }
                | Self::InvalidAssetName { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse(_)
                | Self::Convert(_)
                | Self::ContentRejected(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::PackNotFound { .. } => Some("Run: stickers list"),
            Self::DuplicateIdentifier { .. } => {
                Some("Choose another identifier or delete the existing pack first")
            }
            Self::Validation(_) => Some("Run: stickers validate <ID> for a full report"),
            Self::ConfigNotFound { .. } => Some("Run: stickers init"),
            Self::AssetExists { .. } => {
                Some("Pass --overwrite to replace files left from an earlier pack, or remove them first")
            }
            Self::ContentRejected(_) => {
                Some("URIs look like content://AUTHORITY/metadata[/ID], /stickers/ID or /stickers_asset/ID/FILE")
            }
            Self::Decode(_) => Some("The database may be from another version; run: stickers init"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using StickerError.
pub type Result<T> = std::result::Result<T, StickerError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| StickerError::Other(format!("{}: {e}", f().into())))
    }
}
