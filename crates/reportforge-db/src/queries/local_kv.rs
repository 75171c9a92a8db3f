//! Local key-value store queries.
//!
//! A small string-to-string store with an optional byte quota. Writes that
//! would push the total size (keys plus values) past the quota fail with
//! [`Error::CapacityExceeded`] and leave the store unchanged. Each write
//! stamps a fresh sequence number so [`keys`] lists entries oldest first.

use reportforge_common::{Error, Result};
use rusqlite::{Connection, OptionalExtension};

/// Get the value stored under `key`.
pub fn get_item(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM local_kv WHERE key = :key",
        rusqlite::named_params! { ":key": key },
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Store `value` under `key`, replacing any previous value.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `key` - Entry key
/// * `value` - Entry value
/// * `quota_bytes` - Upper bound for the summed size of all keys and values,
///   or `None` for an unbounded store
///
/// # Returns
///
/// * `Ok(())` - The value was stored
/// * `Err(Error::CapacityExceeded)` - The write would exceed `quota_bytes`
/// * `Err(Error)` - If a database error occurs
pub fn set_item(conn: &Connection, key: &str, value: &str, quota_bytes: Option<u64>) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    if let Some(quota) = quota_bytes {
        let others: i64 = tx
            .query_row(
                "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
                 FROM local_kv WHERE key != :key",
                rusqlite::named_params! { ":key": key },
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        let needed = others as u64 + key.len() as u64 + value.len() as u64;
        if needed > quota {
            return Err(Error::capacity(format!(
                "storing '{}' needs {} bytes, quota is {}",
                key, needed, quota
            )));
        }
    }

    tx.execute(
        "INSERT OR REPLACE INTO local_kv (key, value, seq)
         VALUES (:key, :value, (SELECT COALESCE(MAX(seq), 0) + 1 FROM local_kv))",
        rusqlite::named_params! { ":key": key, ":value": value },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Remove the entry under `key`.
///
/// # Returns
///
/// * `Ok(true)` - If an entry was removed
/// * `Ok(false)` - If there was no entry
pub fn remove_item(conn: &Connection, key: &str) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM local_kv WHERE key = :key",
            rusqlite::named_params! { ":key": key },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}

/// List every key, oldest write first.
pub fn keys(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT key FROM local_kv ORDER BY seq ASC")
        .map_err(|e| Error::database(e.to_string()))?;

    let keys = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(keys)
}

/// Total bytes used by keys and values.
pub fn used_bytes(conn: &Connection) -> Result<u64> {
    let used: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
             FROM local_kv",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(used as u64)
}
