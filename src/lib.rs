//! Reportforge - activity report drafting with tiered image storage
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod context;
pub mod images;
pub mod report;
pub mod storage;
