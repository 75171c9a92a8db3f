//! Core type definitions for reports.
//!
//! Enums are serialized the way existing report documents spell them:
//! status values in lowercase, attachment kinds in SCREAMING_SNAKE_CASE.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Lifecycle status of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Editable, possibly incomplete.
    #[default]
    Draft,
    /// Finalized and ready to print.
    Submitted,
    /// Approved by a reviewer. Nothing in reportforge sets this value.
    Approved,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Submitted => write!(f, "submitted"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            other => Err(Error::invalid_input(format!("unknown report status: {other}"))),
        }
    }
}

/// Kind of document attached to a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentKind {
    /// Decree (Surat Keputusan).
    Sk,
    /// Assignment letter (Surat Tugas).
    St,
    /// Invitation.
    Undangan,
    /// Attendance list.
    DaftarHadir,
    /// Official minutes.
    BeritaAcara,
    /// Anything else.
    #[default]
    Lainnya,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sk => write!(f, "SK"),
            Self::St => write!(f, "ST"),
            Self::Undangan => write!(f, "UNDANGAN"),
            Self::DaftarHadir => write!(f, "DAFTAR_HADIR"),
            Self::BeritaAcara => write!(f, "BERITA_ACARA"),
            Self::Lainnya => write!(f, "LAINNYA"),
        }
    }
}
