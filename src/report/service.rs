//! Report lifecycle operations.
//!
//! [`ReportService`] ties the persistence adapter, the document store, the
//! local draft slot and the image resolver together. Store failures are
//! returned to the caller as they are; nothing here retries.

use std::sync::Arc;

use chrono::Utc;
use reportforge_common::{Error, Result, ReportStatus};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::adapter::{self, WriteLimits, WriteStats};
use super::model::{DraftSlot, Report, ReportForm};
use crate::images::BatchResolver;
use crate::storage::{DocumentStore, KeyValueStore};

/// Default collection of report documents.
pub const DEFAULT_COLLECTION: &str = "laporan";

/// Local key of the draft slot.
pub const DRAFT_SLOT_KEY: &str = "reportforge_draft";

const ORDER_FIELD: &str = "createdAt";

/// Result of a save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub id: String,
    /// The report as stored.
    pub report: Report,
    pub stats: WriteStats,
}

impl SaveOutcome {
    /// Warning to show when images were dropped.
    pub fn warning(&self) -> Option<String> {
        self.stats.warning()
    }
}

/// One resolved image in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub report_id: String,
    pub activity_name: String,
    pub day: u32,
    pub date: String,
    /// Displayable image source.
    pub src: String,
}

/// Report operations over injected stores.
pub struct ReportService {
    documents: Arc<dyn DocumentStore>,
    local: Arc<dyn KeyValueStore>,
    resolver: BatchResolver,
    collection: String,
    limits: WriteLimits,
}

impl ReportService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        local: Arc<dyn KeyValueStore>,
        resolver: BatchResolver,
        collection: impl Into<String>,
        limits: WriteLimits,
    ) -> Self {
        Self {
            documents,
            local,
            resolver,
            collection: collection.into(),
            limits,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn resolver(&self) -> &BatchResolver {
        &self.resolver
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Save the form as a draft.
    ///
    /// The first save creates a document; later saves update the document
    /// remembered in the draft slot.
    pub async fn save_draft(&self, form: &ReportForm) -> Result<SaveOutcome> {
        let existing = self.get_draft()?.and_then(|slot| slot.document_id);
        let report = adapter::to_document_shape(form, ReportStatus::Draft);
        let outcome = self.write(report, existing).await?;

        let slot = DraftSlot {
            form: form.clone(),
            document_id: Some(outcome.id.clone()),
            saved_at: Utc::now(),
        };
        if let Err(e) = self.store_draft(&slot) {
            warn!(error = %e, "Failed to remember draft locally");
        }

        info!(id = %outcome.id, "Draft saved");
        Ok(outcome)
    }

    /// Finalize the form.
    ///
    /// Writes to `editing_id` when given, else to the drafted document, else
    /// to a new document. The draft slot is cleared afterwards.
    pub async fn submit(&self, form: &ReportForm, editing_id: Option<&str>) -> Result<SaveOutcome> {
        let target = match editing_id {
            Some(id) => Some(id.to_string()),
            None => self.get_draft()?.and_then(|slot| slot.document_id),
        };

        let report = adapter::to_document_shape(form, ReportStatus::Submitted);
        let outcome = self.write(report, target).await?;

        if let Err(e) = self.clear_draft() {
            warn!(error = %e, "Failed to clear draft slot");
        }

        info!(id = %outcome.id, "Report submitted");
        Ok(outcome)
    }

    async fn write(&self, report: Report, target: Option<String>) -> Result<SaveOutcome> {
        let (fields, stats) = adapter::prepare_for_write(&report, self.limits).await?;

        let id = match target {
            Some(id) => match self.documents.update(&self.collection, &id, fields.clone()).await {
                Ok(()) => id,
                Err(Error::NotFound(_)) => {
                    warn!(id = %id, "Target document is gone, creating a new one");
                    self.documents.create(&self.collection, fields).await?
                }
                Err(e) => return Err(e),
            },
            None => self.documents.create(&self.collection, fields).await?,
        };

        let report = self.require(&id).await?;
        Ok(SaveOutcome { id, report, stats })
    }

    /// Shallow-merge `partial` into a stored report.
    pub async fn update(&self, id: &str, mut partial: Map<String, Value>) -> Result<Report> {
        for key in ["id", "createdAt", "updatedAt"] {
            partial.remove(key);
        }
        self.documents.update(&self.collection, id, partial).await?;
        info!(id, "Report updated");
        self.require(id).await
    }

    /// Hard-delete a report. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.documents.delete(&self.collection, id).await?;

        if let Ok(Some(slot)) = self.get_draft() {
            if slot.document_id.as_deref() == Some(id) {
                self.clear_draft()?;
            }
        }

        if deleted {
            info!(id, "Report deleted");
        }
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> Result<Option<Report>> {
        self.documents
            .get(&self.collection, id)
            .await?
            .map(adapter::from_document)
            .transpose()
    }

    async fn require(&self, id: &str) -> Result<Report> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("{}/{}", self.collection, id)))
    }

    /// All reports, newest first.
    pub async fn list(&self) -> Result<Vec<Report>> {
        self.documents
            .query_all(&self.collection, ORDER_FIELD, true)
            .await?
            .into_iter()
            .map(adapter::from_document)
            .collect()
    }

    /// A report with every day's images resolved, for the letter layout.
    pub async fn load_resolved(&self, id: &str) -> Result<Option<Report>> {
        let Some(mut report) = self.get(id).await? else {
            return Ok(None);
        };

        let groups = report.image_groups();
        let resolved = self
            .resolver
            .resolve_groups(&groups, self.resolver.timeout())
            .await;

        for (day, images) in report.days.iter_mut().zip(resolved) {
            day.images = images;
        }
        Ok(Some(report))
    }

    /// All images of a report in one resolved list, for the magazine layout.
    pub async fn magazine_images(&self, id: &str) -> Result<Vec<String>> {
        let report = self.require(id).await?;
        let images: Vec<String> = report.all_images().cloned().collect();
        Ok(self
            .resolver
            .resolve_all(&images, self.resolver.timeout())
            .await)
    }

    /// Every image of every report, resolved and tagged with its origin.
    pub async fn gallery(&self) -> Result<Vec<GalleryImage>> {
        let reports = self.list().await?;

        let mut entries = Vec::new();
        for report in &reports {
            let report_id = report.id.clone().unwrap_or_default();
            for day in &report.days {
                for image in &day.images {
                    entries.push((
                        GalleryImage {
                            report_id: report_id.clone(),
                            activity_name: report.activity_name.clone(),
                            day: day.day,
                            date: day.date.clone(),
                            src: String::new(),
                        },
                        vec![image.clone()],
                    ));
                }
            }
        }

        let groups: Vec<Vec<String>> = entries.iter().map(|(_, refs)| refs.clone()).collect();
        let resolved = self
            .resolver
            .resolve_groups(&groups, self.resolver.timeout())
            .await;

        Ok(entries
            .into_iter()
            .zip(resolved)
            .filter_map(|((mut image, _), mut srcs)| {
                image.src = srcs.pop()?;
                Some(image)
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Draft slot
    // -----------------------------------------------------------------------

    /// The locally remembered draft, if any.
    ///
    /// An unreadable slot counts as empty.
    pub fn get_draft(&self) -> Result<Option<DraftSlot>> {
        let Some(raw) = self.local.get_item(DRAFT_SLOT_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(slot) => Ok(Some(slot)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable draft slot");
                Ok(None)
            }
        }
    }

    /// Forget the local draft. Returns whether there was one.
    pub fn clear_draft(&self) -> Result<bool> {
        self.local.remove_item(DRAFT_SLOT_KEY)
    }

    /// Write the draft slot. Cached images give way when the store is full.
    fn store_draft(&self, slot: &DraftSlot) -> Result<()> {
        let raw = serde_json::to_string(slot)?;
        match self.local.set_item(DRAFT_SLOT_KEY, &raw) {
            Err(e) if e.is_capacity() => {
                let evicted = self.resolver.cache().clear();
                info!(evicted, "Local store full, cleared image cache for the draft slot");
                self.local.set_item(DRAFT_SLOT_KEY, &raw)
            }
            other => other,
        }
    }
}
