//! Legacy image store queries.
//!
//! Older reports reference images by key (`rtdb://<key>`) instead of embedding
//! them. Those records live here; new images are never written by the
//! application, but the write path is kept for migrations and tests.

use reportforge_common::{Error, Result};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::documents::{format_timestamp, parse_timestamp};
use crate::models::LegacyImageRecord;

/// Insert a legacy image record under a freshly generated key.
///
/// # Returns
///
/// * `Ok(String)` - The generated key (without any scheme prefix)
/// * `Err(Error)` - If a database error occurs
pub fn insert_legacy_image(
    conn: &Connection,
    collection: &str,
    record: &LegacyImageRecord,
) -> Result<String> {
    let key = format!("-{}", Uuid::new_v4().simple());
    insert_legacy_image_with_key(conn, collection, &key, record)?;
    Ok(key)
}

/// Insert or replace a legacy image record under a known key.
pub fn insert_legacy_image_with_key(
    conn: &Connection,
    collection: &str,
    key: &str,
    record: &LegacyImageRecord,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO legacy_images (collection, key, payload, created_at, size)
         VALUES (:collection, :key, :payload, :created_at, :size)",
        rusqlite::named_params! {
            ":collection": collection,
            ":key": key,
            ":payload": &record.payload,
            ":created_at": format_timestamp(record.created_at),
            ":size": record.size,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a legacy image record by key.
///
/// # Returns
///
/// * `Ok(Some(LegacyImageRecord))` - The record if found
/// * `Ok(None)` - If no record exists under that key
/// * `Err(Error)` - If a database error occurs
pub fn get_legacy_image(
    conn: &Connection,
    collection: &str,
    key: &str,
) -> Result<Option<LegacyImageRecord>> {
    conn.query_row(
        "SELECT payload, created_at, size FROM legacy_images
         WHERE collection = :collection AND key = :key",
        rusqlite::named_params! { ":collection": collection, ":key": key },
        |row| {
            Ok(LegacyImageRecord {
                payload: row.get(0)?,
                created_at: parse_timestamp(1, &row.get::<_, String>(1)?)?,
                size: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Count the legacy image records in a collection.
pub fn count_legacy_images(conn: &Connection, collection: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM legacy_images WHERE collection = :collection",
        rusqlite::named_params! { ":collection": collection },
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}
