//! SQLite-backed store implementations.
//!
//! All three stores share one [`DbPool`]. The async stores run their queries
//! on the blocking thread pool; the key-value store is synchronous by contract
//! and queries inline.

use async_trait::async_trait;
use reportforge_common::{Error, Result};
use reportforge_db::models::{Document, LegacyImageRecord};
use reportforge_db::pool::{get_conn, DbPool};
use reportforge_db::queries::{documents, legacy_images, local_kv};
use rusqlite::Connection;
use serde_json::{Map, Value};

use super::{DocumentStore, KeyValueStore, LegacyImageStore};

/// Run `f` with a pooled connection on the blocking thread pool.
async fn with_conn<T, F>(pool: &DbPool, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = get_conn(&pool)?;
        f(&conn)
    })
    .await
    .map_err(|e| Error::internal(format!("database task failed: {}", e)))?
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// [`DocumentStore`] over the `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<String> {
        let collection = collection.to_string();
        with_conn(&self.pool, move |conn| {
            documents::insert_document(conn, &collection, &fields)
        })
        .await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        with_conn(&self.pool, move |conn| {
            documents::get_document(conn, &collection, &id)
        })
        .await
    }

    async fn update(&self, collection: &str, id: &str, partial: Map<String, Value>) -> Result<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        with_conn(&self.pool, move |conn| {
            documents::update_document(conn, &collection, &id, &partial)
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let (collection, id) = (collection.to_string(), id.to_string());
        with_conn(&self.pool, move |conn| {
            documents::delete_document(conn, &collection, &id)
        })
        .await
    }

    async fn query_all(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<Document>> {
        let (collection, order_by) = (collection.to_string(), order_by.to_string());
        with_conn(&self.pool, move |conn| {
            documents::list_documents(conn, &collection, &order_by, descending)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Legacy images
// ---------------------------------------------------------------------------

/// [`LegacyImageStore`] over the `legacy_images` table.
#[derive(Clone)]
pub struct SqliteLegacyStore {
    pool: DbPool,
}

impl SqliteLegacyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegacyImageStore for SqliteLegacyStore {
    async fn write(&self, collection: &str, record: LegacyImageRecord) -> Result<String> {
        let collection = collection.to_string();
        with_conn(&self.pool, move |conn| {
            legacy_images::insert_legacy_image(conn, &collection, &record)
        })
        .await
    }

    async fn read(&self, collection: &str, key: &str) -> Result<Option<LegacyImageRecord>> {
        let (collection, key) = (collection.to_string(), key.to_string());
        with_conn(&self.pool, move |conn| {
            legacy_images::get_legacy_image(conn, &collection, &key)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Local key-value store
// ---------------------------------------------------------------------------

/// [`KeyValueStore`] over the `local_kv` table with an optional byte quota.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: DbPool,
    quota_bytes: Option<u64>,
}

impl SqliteKeyValueStore {
    pub fn new(pool: DbPool, quota_bytes: Option<u64>) -> Self {
        Self { pool, quota_bytes }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> Result<u64> {
        let conn = get_conn(&self.pool)?;
        local_kv::used_bytes(&conn)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        local_kv::get_item(&conn, key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        local_kv::set_item(&conn, key, value, self.quota_bytes)
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        local_kv::remove_item(&conn, key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = get_conn(&self.pool)?;
        local_kv::keys(&conn)
    }
}
