//! Mapping between reports, stored documents and the editor form.
//!
//! On write, inline images are recompressed and the document body is
//! stripped of the empty values the document store does not accept. On read,
//! store timestamps are folded back into the report as ISO-8601 strings.

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use reportforge_common::{Result, ReportStatus};
use reportforge_db::models::Document;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::model::{ActivityDay, Executor, Report, ReportForm};
use crate::images::codec::{self, CompressionPreset};
use crate::images::reference::{ImageRef, ImageRefKind};

/// Default size bound of one compressed inline image, in bytes.
pub const DEFAULT_MAX_INLINE_BYTES: usize = 900_000;

/// Text fields kept even when empty.
const REQUIRED_TEXT_FIELDS: &[&str] = &["namaKegiatan", "pendahuluan", "deskripsi"];

/// Fields owned by the document store, never written as body fields.
const STORE_OWNED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Limits applied to inline images on write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteLimits {
    pub preset: CompressionPreset,
    /// Compressed images larger than this are dropped.
    pub max_inline_bytes: usize,
}

impl Default for WriteLimits {
    fn default() -> Self {
        Self {
            preset: CompressionPreset::INLINE,
            max_inline_bytes: DEFAULT_MAX_INLINE_BYTES,
        }
    }
}

/// Image counts from one write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Inline images that went through compression.
    pub total_count: usize,
    /// Images dropped because compression failed or the result was too large.
    pub failed_count: usize,
}

impl WriteStats {
    /// User-facing warning, when any image was dropped.
    pub fn warning(&self) -> Option<String> {
        (self.failed_count > 0).then(|| {
            format!(
                "{} of {} images failed to process",
                self.failed_count, self.total_count
            )
        })
    }
}

enum ImageOutcome {
    Keep(String),
    Skip,
    Failed,
}

async fn process_image(raw: &str, limits: WriteLimits) -> ImageOutcome {
    let reference = ImageRef::classify(raw);
    match reference.kind() {
        ImageRefKind::Empty => ImageOutcome::Skip,
        ImageRefKind::Remote | ImageRefKind::Legacy => ImageOutcome::Keep(reference.into_string()),
        ImageRefKind::Inline => {
            let payload = reference.into_string();
            let preset = limits.preset;
            let result = tokio::task::spawn_blocking(move || {
                let compressed = codec::compress_inline(&payload, preset);
                (payload, compressed)
            })
            .await;

            match result {
                Ok((_, Ok(Some(compressed)))) if compressed.len() <= limits.max_inline_bytes => {
                    ImageOutcome::Keep(compressed)
                }
                Ok((_, Ok(Some(compressed)))) => {
                    warn!(
                        size = compressed.len(),
                        limit = limits.max_inline_bytes,
                        "Compressed image still too large, dropping"
                    );
                    ImageOutcome::Failed
                }
                // Not decodable: kept as written, whatever its size
                Ok((original, Ok(None))) => ImageOutcome::Keep(original),
                Ok((_, Err(e))) => {
                    warn!(error = %e, "Image compression failed, dropping");
                    ImageOutcome::Failed
                }
                Err(e) => {
                    warn!(error = %e, "Image compression task failed, dropping");
                    ImageOutcome::Failed
                }
            }
        }
    }
}

/// Build the document body for `report`.
///
/// Inline images are compressed; images whose encode fails or whose
/// compressed size exceeds the limit are dropped and counted. Payloads that
/// do not decode are kept unchanged. The store-owned fields (`id`, `createdAt`, `updatedAt`) are left out.
pub async fn prepare_for_write(
    report: &Report,
    limits: WriteLimits,
) -> Result<(Map<String, Value>, WriteStats)> {
    let mut report = report.clone();
    let mut stats = WriteStats::default();

    for day in &mut report.days {
        let outcomes = join_all(day.images.iter().map(|raw| process_image(raw, limits))).await;

        let mut images = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                ImageOutcome::Keep(image) => images.push(image),
                ImageOutcome::Skip => {}
                ImageOutcome::Failed => stats.failed_count += 1,
            }
        }
        stats.total_count += day
            .images
            .iter()
            .filter(|raw| ImageRefKind::of(raw) == ImageRefKind::Inline)
            .count();
        day.images = images;
    }

    let mut fields = match serde_json::to_value(&report)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for key in STORE_OWNED_FIELDS {
        fields.remove(*key);
    }

    let fields = match sanitize(Value::Object(fields)) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    debug!(
        images = stats.total_count,
        failed = stats.failed_count,
        "Prepared report for write"
    );
    Ok((fields, stats))
}

/// Remove `null`, empty strings, empty arrays and empty objects, recursively.
///
/// Empty strings under [`REQUIRED_TEXT_FIELDS`] keys survive. Returns `None`
/// when nothing is left of `value`.
pub fn sanitize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(sanitize).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, value) in map {
                match value {
                    Value::String(s) if s.is_empty() && REQUIRED_TEXT_FIELDS.contains(&key.as_str()) => {
                        kept.insert(key, Value::String(s));
                    }
                    value => {
                        if let Some(value) = sanitize(value) {
                            kept.insert(key, value);
                        }
                    }
                }
            }
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        other => Some(other),
    }
}

fn iso_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a stored document back into a report.
pub fn from_document(doc: Document) -> Result<Report> {
    let mut fields = doc.fields;
    for key in STORE_OWNED_FIELDS {
        fields.remove(*key);
    }

    let mut report: Report = serde_json::from_value(Value::Object(fields))?;
    report.id = Some(doc.id);
    report.created_at = Some(iso_timestamp(doc.created_at));
    report.updated_at = Some(iso_timestamp(doc.updated_at));
    Ok(report)
}

/// Flatten a report into the single-day editor form.
///
/// Only the first day and the first executor are represented.
pub fn to_form_shape(report: &Report) -> ReportForm {
    let day = report.days.first().cloned().unwrap_or_default();
    let executor = report.executors.first().cloned().unwrap_or_default();

    ReportForm {
        activity_name: report.activity_name.clone(),
        date: day.date,
        start_time: report.start_time.clone(),
        end_time: report.end_time.clone(),
        location: report.venue.clone(),
        description: day.description,
        person_in_charge: executor.name,
        person_in_charge_position: executor.position,
        person_in_charge_nip: executor.nip.filter(|nip| !nip.is_empty()),
        introduction: report.introduction.clone(),
        funding_source: report.funding_source.clone(),
        recommendation: report.recommendation.clone(),
        acknowledgement: report.acknowledgement.clone(),
        images: day.images.into_iter().filter(|i| !i.trim().is_empty()).collect(),
    }
}

/// Build a single-day report from the editor form.
pub fn to_document_shape(form: &ReportForm, status: ReportStatus) -> Report {
    Report {
        activity_name: form.activity_name.clone(),
        introduction: form.introduction.clone(),
        start_time: form.start_time.clone(),
        end_time: form.end_time.clone(),
        venue: form.location.clone(),
        executors: vec![Executor {
            name: form.person_in_charge.clone(),
            position: form.person_in_charge_position.clone(),
            nip: form.person_in_charge_nip.clone().filter(|nip| !nip.is_empty()),
        }],
        funding_source: form.funding_source.clone(),
        days: vec![ActivityDay {
            day: 1,
            date: form.date.clone(),
            description: form.description.clone(),
            images: form
                .images
                .iter()
                .filter(|i| !i.trim().is_empty())
                .cloned()
                .collect(),
        }],
        recommendation: form.recommendation.clone(),
        acknowledgement: form.acknowledgement.clone(),
        status,
        ..Default::default()
    }
}
