//! SQL statements over the sticker tables.
//!
//! Every function takes a plain `&Connection` so callers can run it either
//! directly or inside a [`rusqlite::Transaction`].

use rusqlite::{Connection, ErrorCode, OptionalExtension, params, params_from_iter};
use tracing::trace;

use super::db::{PACK_TABLE, STICKER_TABLE};
use super::mapper::{
    Row, pack_columns, pack_to_row, row_to_pack, row_to_sticker, sticker_columns, sticker_to_row,
};
use crate::error::{Result, StickerError};
use crate::pack::{PackLinks, Sticker, StickerPack};

fn insert_row(conn: &Connection, table: &str, row: &Row) -> rusqlite::Result<usize> {
    let columns: Vec<&str> = row.columns().collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(row.values()))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    )
}

/// Insert a pack row (stickers excluded). A taken identifier yields
/// [`StickerError::DuplicateIdentifier`].
pub fn insert_pack(conn: &Connection, pack: &StickerPack) -> Result<()> {
    insert_row(conn, PACK_TABLE, &pack_to_row(pack)).map_err(|e| {
        if is_unique_violation(&e) {
            StickerError::DuplicateIdentifier {
                identifier: pack.identifier.clone(),
            }
        } else {
            StickerError::storage("insert pack", e)
        }
    })?;
    trace!(identifier = %pack.identifier, "Inserted pack row");
    Ok(())
}

/// Insert one sticker row. A duplicate file name within the pack is a
/// storage error and aborts the surrounding transaction.
pub fn insert_sticker(conn: &Connection, sticker: &Sticker) -> Result<()> {
    insert_row(conn, STICKER_TABLE, &sticker_to_row(sticker))
        .map_err(|e| StickerError::storage("insert sticker", e))?;
    trace!(
        identifier = %sticker.pack_identifier,
        file_name = %sticker.file_name,
        "Inserted sticker row"
    );
    Ok(())
}

pub fn pack_exists(conn: &Connection, identifier: &str) -> Result<bool> {
    conn.query_row(
        &format!("SELECT 1 FROM {PACK_TABLE} WHERE identifier = ?1"),
        params![identifier],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(|e| StickerError::storage("check pack", e))
}

fn pack_select() -> String {
    format!("SELECT {} FROM {PACK_TABLE}", pack_columns::ALL.join(", "))
}

fn sticker_select() -> String {
    format!(
        "SELECT {} FROM {STICKER_TABLE}",
        sticker_columns::ALL.join(", ")
    )
}

/// Load one pack without its stickers.
pub fn select_pack(conn: &Connection, identifier: &str) -> Result<Option<StickerPack>> {
    let row = conn
        .query_row(
            &format!("{} WHERE identifier = ?1", pack_select()),
            params![identifier],
            |r| Row::from_sql(r, &pack_columns::ALL),
        )
        .optional()
        .map_err(|e| StickerError::storage("select pack", e))?;
    row.map(|r| row_to_pack(&r).map_err(StickerError::from))
        .transpose()
}

/// Load every pack without stickers, ordered by identifier.
pub fn select_packs(conn: &Connection) -> Result<Vec<StickerPack>> {
    let mut stmt = conn
        .prepare(&format!("{} ORDER BY identifier", pack_select()))
        .map_err(|e| StickerError::storage("select packs", e))?;
    let rows = stmt
        .query_map([], |r| Row::from_sql(r, &pack_columns::ALL))
        .map_err(|e| StickerError::storage("select packs", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StickerError::storage("select packs", e))?;
    rows.iter()
        .map(|r| row_to_pack(r).map_err(StickerError::from))
        .collect()
}

/// Stickers of one pack in insertion order.
pub fn select_stickers(conn: &Connection, identifier: &str) -> Result<Vec<Sticker>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE pack_identifier = ?1 ORDER BY id",
            sticker_select()
        ))
        .map_err(|e| StickerError::storage("select stickers", e))?;
    let rows = stmt
        .query_map(params![identifier], |r| {
            Row::from_sql(r, &sticker_columns::ALL)
        })
        .map_err(|e| StickerError::storage("select stickers", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StickerError::storage("select stickers", e))?;
    rows.iter()
        .map(|r| row_to_sticker(r).map_err(StickerError::from))
        .collect()
}

/// Load one pack together with its stickers.
pub fn load_pack(conn: &Connection, identifier: &str) -> Result<Option<StickerPack>> {
    let Some(mut pack) = select_pack(conn, identifier)? else {
        return Ok(None);
    };
    pack.stickers = select_stickers(conn, identifier)?;
    Ok(Some(pack))
}

/// Load every pack together with its stickers.
pub fn load_packs(conn: &Connection) -> Result<Vec<StickerPack>> {
    let mut packs = select_packs(conn)?;
    for pack in &mut packs {
        pack.stickers = select_stickers(conn, &pack.identifier)?;
    }
    Ok(packs)
}

pub fn count_stickers(conn: &Connection, identifier: &str) -> Result<usize> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {STICKER_TABLE} WHERE pack_identifier = ?1"),
        params![identifier],
        |r| r.get::<_, i64>(0),
    )
    .map(|n| usize::try_from(n).unwrap_or_default())
    .map_err(|e| StickerError::storage("count stickers", e))
}

pub fn update_pack_name(conn: &Connection, identifier: &str, name: &str) -> Result<usize> {
    conn.execute(
        &format!("UPDATE {PACK_TABLE} SET name = ?1 WHERE identifier = ?2"),
        params![name, identifier],
    )
    .map_err(|e| StickerError::storage("update pack name", e))
}

pub fn update_pack_links(conn: &Connection, identifier: &str, links: &PackLinks) -> Result<usize> {
    conn.execute(
        &format!(
            "UPDATE {PACK_TABLE} SET
                publisher_email = ?1,
                publisher_website = ?2,
                privacy_policy_website = ?3,
                license_agreement_website = ?4,
                android_store_link = ?5,
                ios_store_link = ?6
             WHERE identifier = ?7"
        ),
        params![
            links.publisher_email,
            links.publisher_website,
            links.privacy_policy_website,
            links.license_agreement_website,
            links.android_store_link,
            links.ios_store_link,
            identifier,
        ],
    )
    .map_err(|e| StickerError::storage("update pack links", e))
}

pub fn update_image_data_version(conn: &Connection, identifier: &str, version: &str) -> Result<usize> {
    conn.execute(
        &format!("UPDATE {PACK_TABLE} SET image_data_version = ?1 WHERE identifier = ?2"),
        params![version, identifier],
    )
    .map_err(|e| StickerError::storage("update image data version", e))
}

/// Rename a sticker's file and clear its validity marker.
pub fn update_sticker_file_name(
    conn: &Connection,
    identifier: &str,
    old_file_name: &str,
    new_file_name: &str,
) -> Result<usize> {
    conn.execute(
        &format!(
            "UPDATE {STICKER_TABLE} SET file_name = ?1, validity_marker = ''
             WHERE pack_identifier = ?2 AND file_name = ?3"
        ),
        params![new_file_name, identifier, old_file_name],
    )
    .map_err(|e| StickerError::storage("update sticker file name", e))
}

pub fn update_validity_marker(
    conn: &Connection,
    identifier: &str,
    file_name: &str,
    marker: &str,
) -> Result<usize> {
    conn.execute(
        &format!(
            "UPDATE {STICKER_TABLE} SET validity_marker = ?1
             WHERE pack_identifier = ?2 AND file_name = ?3"
        ),
        params![marker, identifier, file_name],
    )
    .map_err(|e| StickerError::storage("update validity marker", e))
}

/// Delete a pack; its stickers go with it through the cascade.
pub fn delete_pack(conn: &Connection, identifier: &str) -> Result<usize> {
    conn.execute(
        &format!("DELETE FROM {PACK_TABLE} WHERE identifier = ?1"),
        params![identifier],
    )
    .map_err(|e| StickerError::storage("delete pack", e))
}

pub fn delete_sticker(conn: &Connection, identifier: &str, file_name: &str) -> Result<usize> {
    conn.execute(
        &format!("DELETE FROM {STICKER_TABLE} WHERE pack_identifier = ?1 AND file_name = ?2"),
        params![identifier, file_name],
    )
    .map_err(|e| StickerError::storage("delete sticker", e))
}
