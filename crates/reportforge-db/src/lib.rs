//! Reportforge-DB: Database schema, migrations, and query operations
//!
//! This crate provides the SQLite-backed persistence used by reportforge,
//! with rusqlite and r2d2 connection pooling. Three stores live in the same
//! database file:
//!
//! - `documents` - the report document store (JSON bodies per collection)
//! - `legacy_images` - the deprecated image side store, read for old reports
//! - `local_kv` - the quota-bounded local key-value store backing the image cache
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```
//! use reportforge_db::pool::{init_memory_pool, get_conn};
//! use reportforge_db::queries::documents;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let mut fields = serde_json::Map::new();
//! fields.insert("activityName".into(), "Workshop".into());
//! let id = documents::insert_document(&conn, "laporan", &fields).unwrap();
//! assert!(documents::get_document(&conn, "laporan", &id).unwrap().is_some());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
