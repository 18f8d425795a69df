//! Content access layer: the read-only URI surface offered to external
//! consumers.
//!
//! | URI | Result |
//! |-----|--------|
//! | `metadata` | one metadata row per pack |
//! | `metadata/{identifier}` | zero or one metadata row |
//! | `stickers/{identifier}` | one row per sticker of the pack |
//! | `stickers_asset/{identifier}/{file}` | the asset file and its MIME type |
//!
//! Handlers run synchronously on the caller's thread. "Nothing there" is an
//! empty table or [`ContentResponse::NotFound`], never an error; errors are
//! reserved for contract violations and storage faults.

pub mod caller;
pub mod route;
pub mod table;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use caller::{Caller, CallerPolicy, NoWhitelist, StaticWhitelist, WhitelistOracle};
pub use route::{Route, RouteTable, content_uri};
pub use table::{CellValue, ResultTable, columns};

use crate::config::Settings;
use crate::error::StickerError;
use crate::store::{DbHandle, StickerDb, repo};
use crate::validation::Validator;

pub const MIME_WEBP: &str = "image/webp";
pub const MIME_PNG: &str = "image/png";

/// Faults a content request can raise.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Unknown content URI: {0}")]
    UnknownResource(String),

    #[error("Malformed asset URI {uri}: expected {expected} path segments, got {actual}")]
    MalformedPath {
        uri: String,
        expected: usize,
        actual: usize,
    },

    #[error("Caller {caller} may not read assets of pack '{identifier}'")]
    AccessDenied { caller: String, identifier: String },

    #[error(transparent)]
    Store(#[from] StickerError),
}

impl From<ContentError> for StickerError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Store(e) => e,
            other => Self::ContentRejected(other.to_string()),
        }
    }
}

/// Lifecycle of a provider. The store is opened on first access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Uninitialized,
    Ready,
}

/// A readable asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub identifier: String,
    pub file_name: String,
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub len: u64,
}

impl AssetFile {
    /// Open read-only.
    pub fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentResponse {
    Table(ResultTable),
    Asset(AssetFile),
    /// The asset route matched but there is nothing to serve.
    NotFound,
}

pub struct ContentProvider {
    db: Arc<StickerDb>,
    validator: Validator,
    routes: RouteTable,
    policy: CallerPolicy,
    whitelist: Arc<dyn WhitelistOracle>,
    handle: OnceLock<DbHandle>,
}

impl std::fmt::Debug for ContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentProvider")
            .field("authority", &self.routes.authority())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ContentProvider {
    pub fn new(
        db: Arc<StickerDb>,
        validator: Validator,
        authority: impl Into<String>,
        policy: CallerPolicy,
        whitelist: Arc<dyn WhitelistOracle>,
    ) -> Self {
        Self {
            db,
            validator,
            routes: RouteTable::new(authority),
            policy,
            whitelist,
            handle: OnceLock::new(),
        }
    }

    /// Provider configured from [`Settings`], sharing `db` with the writers.
    pub fn from_settings(db: Arc<StickerDb>, settings: &Settings) -> crate::error::Result<Self> {
        let validator = Validator::new(settings.limits.clone(), settings.asset_store()?);
        let policy = CallerPolicy::new(
            settings.owner_package.clone(),
            settings.privileged_callers.iter().cloned(),
        );
        let whitelist = Arc::new(StaticWhitelist::new(settings.whitelisted_packs.iter().cloned()));
        Ok(Self::new(db, validator, settings.authority.clone(), policy, whitelist))
    }

    pub fn state(&self) -> ProviderState {
        if self.handle.get().is_some() {
            ProviderState::Ready
        } else {
            ProviderState::Uninitialized
        }
    }

    pub fn authority(&self) -> &str {
        self.routes.authority()
    }

    pub fn classify(&self, caller_package: Option<&str>) -> Caller {
        self.policy.classify(caller_package)
    }

    fn handle(&self) -> Result<&DbHandle, ContentError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        let handle = self.db.open_for_read()?;
        info!(authority = self.authority(), "Content provider ready");
        Ok(self.handle.get_or_init(|| handle))
    }

    /// Route `uri` to the matching handler.
    #[instrument(skip(self), fields(route = tracing::field::Empty))]
    pub fn dispatch(
        &self,
        uri: &str,
        caller_package: Option<&str>,
    ) -> Result<ContentResponse, ContentError> {
        let route = self.routes.resolve(uri)?;
        tracing::Span::current().record("route", route.name());
        let caller = self.classify(caller_package);
        match route {
            Route::AllPacks => self.all_packs().map(ContentResponse::Table),
            Route::Pack { identifier } => self.pack(&identifier).map(ContentResponse::Table),
            Route::Stickers { identifier } => self.stickers(&identifier).map(ContentResponse::Table),
            Route::Asset {
                identifier,
                file_name,
            } => Ok(self
                .asset(&identifier, &file_name, &caller)?
                .map_or(ContentResponse::NotFound, ContentResponse::Asset)),
        }
    }

    /// Tabular query. Asset URIs are not queryable.
    pub fn query(&self, uri: &str, caller_package: Option<&str>) -> Result<ResultTable, ContentError> {
        match self.routes.resolve(uri)? {
            Route::Asset { .. } => Err(ContentError::UnknownResource(uri.to_string())),
            _ => match self.dispatch(uri, caller_package)? {
                ContentResponse::Table(table) => Ok(table),
                _ => Err(ContentError::UnknownResource(uri.to_string())),
            },
        }
    }

    /// Asset retrieval. `Ok(None)` when there is nothing to serve.
    pub fn open_asset(
        &self,
        uri: &str,
        caller_package: Option<&str>,
    ) -> Result<Option<AssetFile>, ContentError> {
        match self.routes.resolve(uri)? {
            Route::Asset {
                identifier,
                file_name,
            } => self.asset(&identifier, &file_name, &self.classify(caller_package)),
            _ => Err(ContentError::UnknownResource(uri.to_string())),
        }
    }

    /// MIME type of the resource a URI names.
    pub fn mime_type(&self, uri: &str) -> Result<String, ContentError> {
        let authority = self.authority();
        let mime = match self.routes.resolve(uri)? {
            Route::AllPacks => format!("vnd.android.cursor.dir/vnd.{authority}.{}", route::METADATA),
            Route::Pack { .. } => format!("vnd.android.cursor.item/vnd.{authority}.{}", route::METADATA),
            Route::Stickers { .. } => format!("vnd.android.cursor.dir/vnd.{authority}.{}", route::STICKERS),
            Route::Asset {
                identifier,
                file_name,
            } => {
                let tray = self
                    .handle()?
                    .with_conn(|c| repo::select_pack(c, &identifier))?
                    .map(|p| p.tray_image);
                asset_mime(tray.as_deref(), &file_name).to_string()
            }
        };
        Ok(mime)
    }

    fn all_packs(&self) -> Result<ResultTable, ContentError> {
        let packs = self.handle()?.with_conn(repo::select_packs)?;
        if packs.is_empty() {
            debug!("No sticker packs stored");
        }
        Ok(ResultTable::packs(&packs))
    }

    fn pack(&self, identifier: &str) -> Result<ResultTable, ContentError> {
        let pack = self.handle()?.with_conn(|c| repo::select_pack(c, identifier))?;
        if pack.is_none() {
            debug!(identifier, "Pack not found, returning empty table");
        }
        Ok(ResultTable::packs(pack.iter()))
    }

    fn stickers(&self, identifier: &str) -> Result<ResultTable, ContentError> {
        let stickers = self.handle()?.with_conn(|c| repo::select_stickers(c, identifier))?;
        Ok(ResultTable::stickers(&stickers))
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn asset(
        &self,
        identifier: &str,
        file_name: &str,
        caller: &Caller,
    ) -> Result<Option<AssetFile>, ContentError> {
        if !caller.bypasses_whitelist() && !self.whitelist.is_whitelisted(identifier) {
            warn!("Asset access denied for non-whitelisted pack");
            return Err(ContentError::AccessDenied {
                caller: caller.to_string(),
                identifier: identifier.to_string(),
            });
        }

        let Some(pack) = self.handle()?.with_conn(|c| repo::select_pack(c, identifier))? else {
            warn!("Pack not found for asset request");
            return Ok(None);
        };

        let assets = self.validator.assets();
        let Ok(path) = assets.asset_path(identifier, file_name) else {
            warn!("Unsafe asset name in request");
            return Ok(None);
        };
        let len = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                warn!(path = %path.display(), "Asset file missing");
                return Ok(None);
            }
        };

        let is_tray = file_name == pack.tray_image;
        if !is_tray && caller.is_privileged() {
            if !has_webp_extension(file_name) {
                warn!("Asset skipped, not a .webp file");
                return Ok(None);
            }
            if let Err(failure) = self
                .validator
                .check_sticker_file(identifier, file_name, pack.media_kind())
            {
                warn!(code = %failure.code, reason = %failure.message, "Invalid sticker withheld");
                return Ok(None);
            }
        }

        debug!(len, "Serving asset");
        Ok(Some(AssetFile {
            identifier: identifier.to_string(),
            file_name: file_name.to_string(),
            path,
            mime_type: asset_mime(Some(&pack.tray_image), file_name),
            len,
        }))
    }
}

fn has_webp_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("webp"))
}

fn asset_mime(tray_image: Option<&str>, file_name: &str) -> &'static str {
    if tray_image == Some(file_name) {
        MIME_PNG
    } else {
        MIME_WEBP
    }
}
