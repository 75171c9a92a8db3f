//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document: a JSON object body plus store-assigned metadata.
///
/// `created_at` and `updated_at` are owned by the store; they never appear
/// inside `fields`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record in the legacy image side store.
///
/// Serialized with the field names used by records already on disk
/// (`data`, `createdAt`, `size`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyImageRecord {
    /// Inline data URI of the image.
    #[serde(rename = "data")]
    pub payload: String,
    pub created_at: DateTime<Utc>,
    /// Length of `payload` in bytes.
    pub size: i64,
}

impl LegacyImageRecord {
    /// Build a record for `payload` stamped with the current time.
    pub fn new(payload: impl Into<String>) -> Self {
        let payload = payload.into();
        let size = payload.len() as i64;
        Self {
            payload,
            created_at: Utc::now(),
            size,
        }
    }
}
