//! Activity reports: data model, persistence mapping and lifecycle service.

pub mod adapter;
pub mod model;
pub mod service;

pub use adapter::{WriteLimits, WriteStats};
pub use model::{ActivityDay, Attachment, DraftSlot, Executor, Report, ReportForm};
pub use service::{GalleryImage, ReportService, SaveOutcome};
