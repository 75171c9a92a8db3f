use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::images::cache::DEFAULT_CACHE_PREFIX;
use crate::images::codec::{CompressionPreset, DEFAULT_MAX_UPLOAD_MB};
use crate::images::legacy::DEFAULT_LEGACY_COLLECTION;
use crate::images::upload::StorageMode;
use crate::report::adapter::DEFAULT_MAX_INLINE_BYTES;
use crate::report::service::DEFAULT_COLLECTION;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,

    #[serde(default)]
    pub legacy: LegacyConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub blob: BlobConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding documents, legacy images and the local store
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Collection of report documents
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reportforge.db")
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImagesConfig {
    /// Where newly uploaded images go
    #[serde(default)]
    pub storage: StorageMode,

    /// Compressed inline images above this size are dropped on write
    #[serde(default = "default_max_inline_bytes")]
    pub max_inline_bytes: usize,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    #[serde(default = "default_blob_preset")]
    pub blob_preset: CompressionPreset,

    #[serde(default = "default_inline_preset")]
    pub inline_preset: CompressionPreset,
}

fn default_max_inline_bytes() -> usize {
    DEFAULT_MAX_INLINE_BYTES
}
fn default_max_upload_mb() -> u64 {
    DEFAULT_MAX_UPLOAD_MB
}
fn default_blob_preset() -> CompressionPreset {
    CompressionPreset::BLOB
}
fn default_inline_preset() -> CompressionPreset {
    CompressionPreset::INLINE
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            storage: StorageMode::default(),
            max_inline_bytes: default_max_inline_bytes(),
            max_upload_mb: default_max_upload_mb(),
            blob_preset: default_blob_preset(),
            inline_preset: default_inline_preset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResolveConfig {
    /// Deadline for one batch of image resolutions
    #[serde(default = "default_resolve_timeout")]
    pub timeout_ms: u64,
}

fn default_resolve_timeout() -> u64 {
    5000
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_resolve_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LegacyConfig {
    /// REST endpoint of the legacy image database; the local table is used when unset
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_legacy_collection")]
    pub collection: String,

    /// Per-request timeout of the HTTP client
    #[serde(default = "default_legacy_timeout")]
    pub timeout_ms: u64,
}

fn default_legacy_collection() -> String {
    DEFAULT_LEGACY_COLLECTION.to_string()
}
fn default_legacy_timeout() -> u64 {
    10_000
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            collection: default_legacy_collection(),
            timeout_ms: default_legacy_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,

    /// Byte quota of the local store (keys plus values)
    #[serde(default = "default_quota")]
    pub quota_bytes: u64,
}

fn default_cache_prefix() -> String {
    DEFAULT_CACHE_PREFIX.to_string()
}
fn default_quota() -> u64 {
    5 * 1024 * 1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: default_cache_prefix(),
            quota_bytes: default_quota(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BlobConfig {
    /// Upload endpoint; required when `images.storage = "remote"`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Base of the returned download URLs, defaults to `base_url`
    #[serde(default)]
    pub public_base_url: Option<String>,
}
