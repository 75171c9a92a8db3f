//! Storage backends used by the report and image subsystems.
//!
//! Each external store is a trait so that the application can pick one
//! implementation per environment at startup and tests can substitute fakes:
//!
//! - [`DocumentStore`] - report documents (JSON bodies with store timestamps)
//! - [`BlobStore`] - standalone image uploads, addressed by URL
//! - [`LegacyImageStore`] - the deprecated keyed image store
//! - [`KeyValueStore`] - the small, quota-bounded local store behind the image cache

mod http;
mod sqlite;

pub use http::{HttpBlobStore, HttpLegacyStore};
pub use sqlite::{SqliteDocumentStore, SqliteKeyValueStore, SqliteLegacyStore};

use async_trait::async_trait;
use reportforge_common::Result;
use reportforge_db::models::{Document, LegacyImageRecord};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

/// Persistent document storage grouped by collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `fields` as a new document and return its id.
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<String>;

    /// Fetch a document, or `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Shallow-merge `partial` into an existing document.
    ///
    /// Fails with `Error::NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, partial: Map<String, Value>) -> Result<()>;

    /// Hard-delete a document. Returns whether anything was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Every document in the collection ordered by `order_by`.
    async fn query_all(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<Document>>;
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

/// Remote storage for standalone image files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path` and return a URL that serves them.
    async fn upload(&self, bytes: Vec<u8>, path: &str, content_type: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Legacy image store
// ---------------------------------------------------------------------------

/// The keyed image store used by older reports (`rtdb://<key>` references).
#[async_trait]
pub trait LegacyImageStore: Send + Sync {
    /// Write a record under a newly generated key and return the key.
    async fn write(&self, collection: &str, record: LegacyImageRecord) -> Result<String>;

    /// Read a record, or `None` when the key is unknown.
    async fn read(&self, collection: &str, key: &str) -> Result<Option<LegacyImageRecord>>;
}

// ---------------------------------------------------------------------------
// Local key-value store
// ---------------------------------------------------------------------------

/// Small synchronous string store with a byte quota.
///
/// Implementations must report a full store as `Error::CapacityExceeded`
/// and leave the store unchanged when they do.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Returns whether an entry was removed.
    fn remove_item(&self, key: &str) -> Result<bool>;

    /// All keys, oldest write first.
    fn keys(&self) -> Result<Vec<String>>;
}
