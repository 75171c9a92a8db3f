//! Resolution of legacy image keys against the legacy store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::storage::LegacyImageStore;

/// Default collection holding legacy image records.
pub const DEFAULT_LEGACY_COLLECTION: &str = "images";

/// Fetches legacy image payloads with a per-call timeout.
///
/// Every failure mode (timeout, missing record, empty payload, store error)
/// yields `None`. Results are not cached here.
#[derive(Clone)]
pub struct LegacyResolver {
    store: Arc<dyn LegacyImageStore>,
    collection: String,
}

impl LegacyResolver {
    pub fn new(store: Arc<dyn LegacyImageStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Fetch the payload stored under `key`, giving up after `timeout`.
    pub async fn resolve(&self, key: &str, timeout: Duration) -> Option<String> {
        let fetch = self.store.read(&self.collection, key);

        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(Some(record))) if !record.payload.is_empty() => Some(record.payload),
            Ok(Ok(_)) => {
                debug!(key, "Legacy image not found");
                None
            }
            Ok(Err(e)) => {
                warn!(key, error = %e, "Legacy image fetch failed");
                None
            }
            Err(_) => {
                warn!(key, timeout_ms = timeout.as_millis() as u64, "Legacy image fetch timed out");
                None
            }
        }
    }
}
