//! Reportforge-Common: Shared types, identifiers, and errors.
//!
//! This crate provides common functionality used across reportforge:
//!
//! - **Typed IDs**: Wrappers for report document identifiers
//! - **Core Types**: Enums for report status and attachment kinds
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use reportforge_common::{Error, ReportId, ReportStatus, Result};
//!
//! let id = ReportId::generate();
//! assert!(!id.as_str().is_empty());
//! assert_eq!(ReportStatus::Draft.to_string(), "draft");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("report"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
