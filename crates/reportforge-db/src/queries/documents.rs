//! Document store queries.
//!
//! Documents are JSON objects grouped by collection. The store assigns ids
//! and both timestamps; `update_document` performs a shallow merge of the
//! given fields into the stored body, mirroring partial-update semantics.

use chrono::{DateTime, SecondsFormat, Utc};
use reportforge_common::{Error, ReportId, Result};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::models::Document;

/// Field names that map onto the timestamp columns instead of the JSON body.
const CREATED_AT_FIELD: &str = "createdAt";
const UPDATED_AT_FIELD: &str = "updatedAt";

/// Format a timestamp the way the `documents` table stores it.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp column.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse a document from a database row.
///
/// Expects columns in order: id, body, created_at, updated_at.
fn parse_document_row(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let body: String = row.get(1)?;
    let fields = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(e),
            ))
        }
    };

    Ok(Document {
        id: row.get(0)?,
        fields,
        created_at: parse_timestamp(2, &row.get::<_, String>(2)?)?,
        updated_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
    })
}

/// Insert a new document and return its store-assigned id.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `collection` - Collection name (e.g. `"laporan"`)
/// * `fields` - Document body
pub fn insert_document(
    conn: &Connection,
    collection: &str,
    fields: &Map<String, Value>,
) -> Result<String> {
    let id = ReportId::generate().to_string();
    let now = format_timestamp(Utc::now());
    let body = serde_json::to_string(fields)?;

    conn.execute(
        "INSERT INTO documents (collection, id, body, created_at, updated_at)
         VALUES (:collection, :id, :body, :now, :now)",
        rusqlite::named_params! {
            ":collection": collection,
            ":id": &id,
            ":body": body,
            ":now": now,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(id)
}

/// Get a document by id.
///
/// # Returns
///
/// * `Ok(Some(Document))` - The document if found
/// * `Ok(None)` - If the document does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_document(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
    conn.query_row(
        "SELECT id, body, created_at, updated_at
         FROM documents WHERE collection = :collection AND id = :id",
        rusqlite::named_params! { ":collection": collection, ":id": id },
        parse_document_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Merge `partial` into an existing document and refresh `updated_at`.
///
/// Top-level keys in `partial` replace the stored values; keys not present
/// in `partial` are left untouched.
///
/// # Returns
///
/// * `Ok(())` - The document was updated
/// * `Err(Error::NotFound)` - If the document does not exist
/// * `Err(Error)` - If a database error occurs
pub fn update_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    partial: &Map<String, Value>,
) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let mut existing = get_document(&tx, collection, id)?
        .ok_or_else(|| Error::not_found(format!("{}/{}", collection, id)))?;

    for (key, value) in partial {
        existing.fields.insert(key.clone(), value.clone());
    }

    let body = serde_json::to_string(&existing.fields)?;
    tx.execute(
        "UPDATE documents SET body = :body, updated_at = :now
         WHERE collection = :collection AND id = :id",
        rusqlite::named_params! {
            ":body": body,
            ":now": format_timestamp(Utc::now()),
            ":collection": collection,
            ":id": id,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Delete a document.
///
/// # Returns
///
/// * `Ok(true)` - If the document was deleted
/// * `Ok(false)` - If the document did not exist
pub fn delete_document(conn: &Connection, collection: &str, id: &str) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM documents WHERE collection = :collection AND id = :id",
            rusqlite::named_params! { ":collection": collection, ":id": id },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows > 0)
}

/// List every document in a collection ordered by a field.
///
/// `createdAt` and `updatedAt` order by the store timestamps; any other name
/// orders by that top-level field of the JSON body. Ties keep insertion order
/// in the requested direction.
pub fn list_documents(
    conn: &Connection,
    collection: &str,
    order_by: &str,
    descending: bool,
) -> Result<Vec<Document>> {
    let direction = if descending { "DESC" } else { "ASC" };

    let column = match order_by {
        CREATED_AT_FIELD => Some("created_at"),
        UPDATED_AT_FIELD => Some("updated_at"),
        _ => None,
    };

    let documents = match column {
        Some(column) => {
            let sql = format!(
                "SELECT id, body, created_at, updated_at FROM documents
                 WHERE collection = :collection
                 ORDER BY {column} {direction}, rowid {direction}"
            );
            let mut stmt = conn.prepare(&sql).map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map(
                    rusqlite::named_params! { ":collection": collection },
                    parse_document_row,
                )
                .map_err(|e| Error::database(e.to_string()))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        }
        None => {
            let sql = format!(
                "SELECT id, body, created_at, updated_at FROM documents
                 WHERE collection = :collection
                 ORDER BY json_extract(body, :path) {direction}, rowid {direction}"
            );
            let mut stmt = conn.prepare(&sql).map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map(
                    rusqlite::named_params! {
                        ":collection": collection,
                        ":path": format!("$.\"{}\"", order_by.replace('"', "")),
                    },
                    parse_document_row,
                )
                .map_err(|e| Error::database(e.to_string()))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
        }
    };

    documents.map_err(|e| Error::database(e.to_string()))
}

/// Count the documents in a collection.
pub fn count_documents(conn: &Connection, collection: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = :collection",
        rusqlite::named_params! { ":collection": collection },
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_insert_and_get_document() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let id = insert_document(
            &conn,
            "laporan",
            &fields(json!({"activityName": "Rapat Koordinasi", "status": "draft"})),
        )
        .unwrap();

        let doc = get_document(&conn, "laporan", &id).unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.fields["activityName"], "Rapat Koordinasi");
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn test_get_document_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        assert!(get_document(&conn, "laporan", "missing").unwrap().is_none());
    }

    #[test]
    fn test_collections_are_isolated() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let id = insert_document(&conn, "laporan", &fields(json!({"a": 1}))).unwrap();
        assert!(get_document(&conn, "other", &id).unwrap().is_none());
        assert_eq!(count_documents(&conn, "laporan").unwrap(), 1);
        assert_eq!(count_documents(&conn, "other").unwrap(), 0);
    }

    #[test]
    fn test_update_document_merges_fields() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let id = insert_document(
            &conn,
            "laporan",
            &fields(json!({"activityName": "Old", "venue": "Aula"})),
        )
        .unwrap();
        let before = get_document(&conn, "laporan", &id).unwrap().unwrap();

        update_document(
            &conn,
            "laporan",
            &id,
            &fields(json!({"activityName": "New", "status": "submitted"})),
        )
        .unwrap();

        let after = get_document(&conn, "laporan", &id).unwrap().unwrap();
        assert_eq!(after.fields["activityName"], "New");
        assert_eq!(after.fields["venue"], "Aula");
        assert_eq!(after.fields["status"], "submitted");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_update_missing_document_is_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let err = update_document(&conn, "laporan", "nope", &Map::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_delete_document() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let id = insert_document(&conn, "laporan", &fields(json!({"a": 1}))).unwrap();
        assert!(delete_document(&conn, "laporan", &id).unwrap());
        assert!(!delete_document(&conn, "laporan", &id).unwrap());
        assert!(get_document(&conn, "laporan", &id).unwrap().is_none());
    }

    #[test]
    fn test_list_documents_by_created_at_desc() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let first = insert_document(&conn, "laporan", &fields(json!({"n": 1}))).unwrap();
        let second = insert_document(&conn, "laporan", &fields(json!({"n": 2}))).unwrap();
        let third = insert_document(&conn, "laporan", &fields(json!({"n": 3}))).unwrap();

        let docs = list_documents(&conn, "laporan", "createdAt", true).unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[test]
    fn test_list_documents_by_body_field() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        insert_document(&conn, "laporan", &fields(json!({"activityName": "b"}))).unwrap();
        insert_document(&conn, "laporan", &fields(json!({"activityName": "c"}))).unwrap();
        insert_document(&conn, "laporan", &fields(json!({"activityName": "a"}))).unwrap();

        let docs = list_documents(&conn, "laporan", "activityName", false).unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|d| d.fields["activityName"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let now = Utc::now();
        let formatted = format_timestamp(now);
        let parsed = parse_timestamp(0, &formatted).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }
}
