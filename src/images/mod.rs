//! Image references, compression, caching and resolution.
//!
//! Report images are plain strings in one of several representations:
//! inline data URIs, remote blob URLs, or `rtdb://` keys into the legacy
//! store. This module classifies them, compresses new ones before storage,
//! and resolves stored ones back into something a renderer can display.

pub mod cache;
pub mod codec;
pub mod legacy;
pub mod reference;
pub mod resolver;
pub mod upload;

pub use cache::ImageCache;
pub use codec::{compress, try_compress, CodecError, CompressionPreset};
pub use legacy::LegacyResolver;
pub use reference::{ImageRef, ImageRefKind};
pub use resolver::BatchResolver;
pub use upload::{ImageUploader, StorageMode, UploadFile, UploadSummary};
