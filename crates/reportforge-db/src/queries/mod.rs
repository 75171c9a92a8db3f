//! Database query modules.
//!
//! Each module provides query functions for a specific table.

pub mod documents;
pub mod legacy_images;
pub mod local_kv;
