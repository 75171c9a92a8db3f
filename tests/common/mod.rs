//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, default config and
//! a full [`AppContext`] over it.

#![allow(dead_code)]

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use reportforge::config::Config;
use reportforge::context::AppContext;
use reportforge::images::ImageRef;
use reportforge::report::ReportForm;
use reportforge::storage::{LegacyImageStore, SqliteLegacyStore};
use reportforge_db::models::LegacyImageRecord;
use reportforge_db::pool::DbPool;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration and in-memory DB.
    pub fn with_config(config: Config) -> Self {
        let ctx = AppContext::in_memory(config).expect("failed to build context");
        let db = ctx.db.clone();
        Self { ctx, db }
    }

    /// Store `payload` in the local legacy table and return its reference.
    pub async fn seed_legacy(&self, payload: &str) -> String {
        let store = SqliteLegacyStore::new(self.db.clone());
        let key = store
            .write(&self.ctx.config.legacy.collection, LegacyImageRecord::new(payload))
            .await
            .expect("failed to seed legacy image");
        ImageRef::legacy(&key).into_string()
    }
}

/// A filled-in single-day form.
pub fn sample_form(name: &str) -> ReportForm {
    ReportForm {
        activity_name: name.to_string(),
        date: "2024-05-01".into(),
        start_time: "08:00".into(),
        end_time: "12:00".into(),
        location: "Aula Kantor".into(),
        description: "Pelaksanaan kegiatan".into(),
        person_in_charge: "Budi".into(),
        person_in_charge_position: "Kepala Seksi".into(),
        introduction: "Latar belakang".into(),
        ..Default::default()
    }
}

/// PNG bytes of a solid `width` x `height` image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("failed to encode png");
    buf
}

/// `png_bytes` as an inline data URI.
pub fn png_data_uri(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(width, height)))
}

/// A short inline payload that is not a decodable image.
pub fn opaque_data_uri(tag: &str) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(tag))
}
