//! Sticker pack domain types.
//!
//! A [`StickerPack`] owns an ordered list of [`Sticker`]s. Everything that
//! leaves or enters the database passes through these types; the row shapes
//! live in [`crate::store::mapper`].

mod schema;

pub use schema::{
    MAX_IDENTIFIER_LEN, MAX_NAME_LEN, MAX_PUBLISHER_LEN, MediaKind, PackLinks, Sticker,
    StickerPack,
};
