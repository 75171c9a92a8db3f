//! Report data model.
//!
//! Field names on the wire are the ones existing report documents use
//! (`namaKegiatan`, `uraianKegiatan`, `gambar`, ...); the Rust names are
//! their English equivalents. Every field defaults when absent, since the
//! write path strips empty values before storing.

use chrono::{DateTime, Utc};
use reportforge_common::{AttachmentKind, ReportStatus};
use serde::{Deserialize, Deserializer, Serialize};

/// Image list deserializer that tolerates `null` for the list and its entries.
pub(crate) fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let images = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(images.unwrap_or_default().into_iter().flatten().collect())
}

fn first_day() -> u32 {
    1
}

/// One day of activity within a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDay {
    /// 1-based day number.
    #[serde(rename = "hari", default = "first_day")]
    pub day: u32,
    #[serde(rename = "tanggal", default)]
    pub date: String,
    /// Rich-text HTML.
    #[serde(rename = "deskripsi", default)]
    pub description: String,
    /// Image references in display order.
    #[serde(rename = "gambar", default, deserialize_with = "deserialize_images")]
    pub images: Vec<String>,
}

impl Default for ActivityDay {
    fn default() -> Self {
        Self {
            day: first_day(),
            date: String::new(),
            description: String::new(),
            images: Vec::new(),
        }
    }
}

/// A person carrying out the activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Executor {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "jabatan")]
    pub position: String,
    /// Employee number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
}

/// A document attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "jenis")]
    pub kind: AttachmentKind,
    /// URL or data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// An activity report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "namaKegiatan")]
    pub activity_name: String,
    /// Background, legal basis and goals in one rich-text block.
    #[serde(rename = "pendahuluan")]
    pub introduction: String,
    #[serde(rename = "waktuMulai")]
    pub start_time: String,
    #[serde(rename = "waktuSelesai")]
    pub end_time: String,
    #[serde(rename = "tempatPelaksanaan")]
    pub venue: String,
    #[serde(rename = "pelaksana")]
    pub executors: Vec<Executor>,
    #[serde(rename = "sumberPendanaan")]
    pub funding_source: String,
    #[serde(rename = "uraianKegiatan")]
    pub days: Vec<ActivityDay>,
    #[serde(rename = "rekomendasi")]
    pub recommendation: String,
    #[serde(rename = "ucapanTerimakasih")]
    pub acknowledgement: String,
    #[serde(rename = "lampiran")]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub status: ReportStatus,
    #[serde(rename = "createdBy", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Report {
    /// Every image reference of every day, in day order.
    pub fn all_images(&self) -> impl Iterator<Item = &String> {
        self.days.iter().flat_map(|d| d.images.iter())
    }

    /// Image lists grouped per day.
    pub fn image_groups(&self) -> Vec<Vec<String>> {
        self.days.iter().map(|d| d.images.clone()).collect()
    }
}

/// The flat single-day form the report editor works with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    #[serde(rename = "namaKegiatan")]
    pub activity_name: String,
    #[serde(rename = "tanggal")]
    pub date: String,
    #[serde(rename = "waktuMulai")]
    pub start_time: String,
    #[serde(rename = "waktuSelesai")]
    pub end_time: String,
    #[serde(rename = "lokasi")]
    pub location: String,
    #[serde(rename = "deskripsi")]
    pub description: String,
    #[serde(rename = "penanggungJawab")]
    pub person_in_charge: String,
    #[serde(rename = "jabatanPenanggungJawab")]
    pub person_in_charge_position: String,
    #[serde(rename = "nipPenanggungJawab", skip_serializing_if = "Option::is_none")]
    pub person_in_charge_nip: Option<String>,
    #[serde(rename = "pendahuluan")]
    pub introduction: String,
    #[serde(rename = "sumberPendanaan")]
    pub funding_source: String,
    #[serde(rename = "rekomendasi")]
    pub recommendation: String,
    #[serde(rename = "ucapanTerimakasih")]
    pub acknowledgement: String,
    #[serde(rename = "gambar", alias = "gambarPreview", deserialize_with = "deserialize_images")]
    pub images: Vec<String>,
}

/// The locally remembered draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSlot {
    #[serde(flatten)]
    pub form: ReportForm,
    /// Document the draft was last written to.
    #[serde(alias = "firebaseId", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}
