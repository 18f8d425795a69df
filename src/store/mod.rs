//! Persistent storage for sticker packs.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/stickers/
//! ├── stickers.db                # SQLite database (sticker_pack, sticker)
//! └── stickers_asset/            # One directory per pack
//! ```
//!
//! [`StickerDb`] owns the schema and the single shared connection,
//! [`mapper`] converts between rows and entities, [`repo`] holds the SQL and
//! [`AssetStore`] manages files.

mod assets;
mod db;
pub mod mapper;
pub mod repo;

pub use assets::{ASSET_DIR_NAME, AssetStore, is_safe_segment};
pub use db::{DB_FILE_NAME, DbHandle, PACK_TABLE, SCHEMA_VERSION, STICKER_TABLE, StickerDb};
