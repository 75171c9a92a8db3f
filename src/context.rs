//! Wiring of stores and services from configuration.

use std::sync::Arc;
use std::time::Duration;

use reportforge_common::Result;
use reportforge_db::pool::{init_memory_pool, init_pool, DbPool};
use tracing::info;

use crate::config::Config;
use crate::images::{BatchResolver, ImageCache, ImageUploader, LegacyResolver, StorageMode};
use crate::report::{ReportService, WriteLimits};
use crate::storage::{
    BlobStore, HttpBlobStore, HttpLegacyStore, KeyValueStore, LegacyImageStore,
    SqliteDocumentStore, SqliteKeyValueStore, SqliteLegacyStore,
};

/// Everything a command needs, built once per process.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub reports: Arc<ReportService>,
    pub uploader: Arc<ImageUploader>,
    pub local: Arc<SqliteKeyValueStore>,
}

impl AppContext {
    /// Open the configured database file and build the context over it.
    pub fn from_config(config: Config) -> Result<Self> {
        let path = config.database.path.to_string_lossy().into_owned();
        info!("Opening database at {}", path);
        let db = init_pool(&path)?;
        Self::with_pool(config, db)
    }

    /// Context over a fresh in-memory database.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_pool(config, init_memory_pool()?)
    }

    pub fn with_pool(config: Config, db: DbPool) -> Result<Self> {
        let local = Arc::new(SqliteKeyValueStore::new(
            db.clone(),
            Some(config.cache.quota_bytes),
        ));

        let legacy_store: Arc<dyn LegacyImageStore> = match &config.legacy.base_url {
            Some(url) => {
                info!(url = %url, "Using remote legacy image store");
                Arc::new(HttpLegacyStore::new(
                    url.clone(),
                    Duration::from_millis(config.legacy.timeout_ms),
                )?)
            }
            None => Arc::new(SqliteLegacyStore::new(db.clone())),
        };

        let cache = ImageCache::new(
            local.clone() as Arc<dyn KeyValueStore>,
            config.cache.prefix.clone(),
        );
        let legacy = LegacyResolver::new(legacy_store, config.legacy.collection.clone());
        let resolver = BatchResolver::new(
            cache,
            legacy,
            Duration::from_millis(config.resolve.timeout_ms),
        );

        let reports = ReportService::new(
            Arc::new(SqliteDocumentStore::new(db.clone())),
            local.clone(),
            resolver,
            config.database.collection.clone(),
            WriteLimits {
                preset: config.images.inline_preset,
                max_inline_bytes: config.images.max_inline_bytes,
            },
        );

        let uploader = match (config.images.storage, &config.blob.base_url) {
            (StorageMode::Remote, Some(url)) => {
                let blob: Arc<dyn BlobStore> = Arc::new(HttpBlobStore::new(
                    url.clone(),
                    config.blob.public_base_url.clone(),
                )?);
                ImageUploader::remote(blob, config.images.blob_preset, config.images.max_upload_mb)
            }
            _ => ImageUploader::inline(config.images.inline_preset, config.images.max_upload_mb),
        };

        Ok(Self {
            db,
            config: Arc::new(config),
            reports: Arc::new(reports),
            uploader: Arc::new(uploader),
            local,
        })
    }

    pub fn resolver(&self) -> &BatchResolver {
        self.reports.resolver()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_defaults_to_inline_uploads() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        assert_eq!(ctx.uploader.mode(), StorageMode::Inline);
        assert_eq!(ctx.reports.collection(), "laporan");
        assert_eq!(ctx.resolver().timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_remote_storage_uses_blob_store() {
        let mut config = Config::default();
        config.images.storage = StorageMode::Remote;
        config.blob.base_url = Some("http://127.0.0.1:9/upload".into());

        let ctx = AppContext::in_memory(config).unwrap();
        assert_eq!(ctx.uploader.mode(), StorageMode::Remote);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("reports.db");

        let ctx = AppContext::from_config(config).unwrap();
        assert!(ctx.local.used_bytes().unwrap() == 0);
        assert!(dir.path().join("reports.db").exists());
    }
}
