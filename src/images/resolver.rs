//! Batch resolution of image references into displayable values.
//!
//! Every consumer of report images (list view, gallery, both print layouts)
//! goes through [`BatchResolver`]. Inline and remote references pass through
//! untouched; legacy references are looked up in the local cache and then
//! fetched from the legacy store, all concurrently and under one deadline.
//! Nothing here returns an error: an image that cannot be resolved in time is
//! simply left out.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::cache::ImageCache;
use super::legacy::LegacyResolver;
use super::reference::{ImageRef, ImageRefKind};

/// Default deadline for one resolution batch.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Resolves batches of image references.
#[derive(Clone)]
pub struct BatchResolver {
    cache: ImageCache,
    legacy: LegacyResolver,
    timeout: Duration,
}

impl BatchResolver {
    pub fn new(cache: ImageCache, legacy: LegacyResolver, timeout: Duration) -> Self {
        Self {
            cache,
            legacy,
            timeout,
        }
    }

    /// Configured default deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Resolve a flat list of references.
    ///
    /// The output keeps the relative order of the input with empty and
    /// unresolvable entries removed.
    pub async fn resolve_all(&self, refs: &[String], timeout: Duration) -> Vec<String> {
        self.resolve_groups(&[refs.to_vec()], timeout)
            .await
            .pop()
            .unwrap_or_default()
    }

    /// Resolve several lists at once under one shared deadline.
    ///
    /// Returns one output list per input list, each filtered like
    /// [`resolve_all`](Self::resolve_all).
    pub async fn resolve_groups(&self, groups: &[Vec<String>], timeout: Duration) -> Vec<Vec<String>> {
        let classified: Vec<Vec<ImageRef>> = groups
            .iter()
            .map(|group| group.iter().map(|raw| ImageRef::classify(raw.as_str())).collect())
            .collect();

        let legacy_count = classified
            .iter()
            .flatten()
            .filter(|r| r.kind() == ImageRefKind::Legacy)
            .count();

        // No legacy refs: no tasks, no timer
        if legacy_count == 0 {
            return classified
                .into_iter()
                .map(|group| {
                    group
                        .into_iter()
                        .filter(|r| r.kind() != ImageRefKind::Empty)
                        .map(ImageRef::into_string)
                        .collect()
                })
                .collect();
        }

        let deadline = Instant::now() + timeout;
        let mut resolved = self.fetch_legacy(&classified, deadline).await;

        info!(
            legacy = legacy_count,
            resolved = resolved.len(),
            "Resolved legacy image references"
        );

        classified
            .into_iter()
            .enumerate()
            .map(|(gi, group)| {
                group
                    .into_iter()
                    .enumerate()
                    .filter_map(|(ii, r)| match r.kind() {
                        ImageRefKind::Empty => None,
                        ImageRefKind::Inline | ImageRefKind::Remote => Some(r.into_string()),
                        ImageRefKind::Legacy => resolved.remove(&(gi, ii)),
                    })
                    .collect()
            })
            .collect()
    }

    /// Resolve a single reference with the configured deadline.
    pub async fn resolve_one(&self, raw: &str) -> Option<String> {
        let r = ImageRef::classify(raw);
        match r.kind() {
            ImageRefKind::Empty => None,
            ImageRefKind::Inline | ImageRefKind::Remote => Some(r.into_string()),
            ImageRefKind::Legacy => {
                let key = r.legacy_key()?;
                self.resolve_key(key, Instant::now() + self.timeout).await
            }
        }
    }

    /// Fetch every legacy entry concurrently until `deadline`.
    ///
    /// Returns the payloads keyed by (group, index). Tasks still running at
    /// the deadline are aborted.
    async fn fetch_legacy(
        &self,
        classified: &[Vec<ImageRef>],
        deadline: Instant,
    ) -> HashMap<(usize, usize), String> {
        let mut tasks = JoinSet::new();
        for (gi, group) in classified.iter().enumerate() {
            for (ii, r) in group.iter().enumerate() {
                if let Some(key) = r.legacy_key() {
                    let resolver = self.clone();
                    let key = key.to_string();
                    tasks.spawn(async move {
                        let payload = resolver.resolve_key(&key, deadline).await;
                        (gi, ii, payload)
                    });
                }
            }
        }

        let mut resolved = HashMap::new();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((gi, ii, Some(payload))))) => {
                    resolved.insert((gi, ii), payload);
                }
                Ok(Some(Ok((_, _, None)))) => {}
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "Image resolution task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        pending = tasks.len(),
                        "Image resolution deadline reached, dropping pending images"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        resolved
    }

    /// Cache first, then the legacy store. Successful fetches are cached.
    ///
    /// The cache sits on a synchronous store, so both cache calls run on the
    /// blocking pool.
    async fn resolve_key(&self, key: &str, deadline: Instant) -> Option<String> {
        let cache = self.cache.clone();
        let lookup = key.to_string();
        if let Ok(Some(payload)) = tokio::task::spawn_blocking(move || cache.get(&lookup)).await {
            return Some(payload);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let payload = self.legacy.resolve(key, remaining).await?;
        debug!(key, size = payload.len(), "Fetched legacy image");

        let cache = self.cache.clone();
        let (entry_key, entry) = (key.to_string(), payload.clone());
        if let Err(e) = tokio::task::spawn_blocking(move || cache.put(&entry_key, &entry)).await {
            warn!(key, error = %e, "Image cache write task failed");
        }
        Some(payload)
    }
}
