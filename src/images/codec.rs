//! Image compression for storage.
//!
//! Images are downsampled so their longer side fits a preset bound and then
//! re-encoded as JPEG. Compression is best-effort: a payload that cannot be
//! decoded comes back unchanged from [`compress`].

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reportforge_common::Error;

use super::reference::INLINE_PREFIX;

/// MIME type of every compressed output.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Content types accepted for upload.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Default upload size limit, in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 5;

/// Size bound and quality used for one compression call site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionPreset {
    /// Upper bound for the longer side, in pixels.
    pub max_dimension: u32,
    /// Lossy quality in `0.0..=1.0`.
    pub quality: f32,
}

impl CompressionPreset {
    /// Standalone uploads to the blob store.
    pub const BLOB: Self = Self {
        max_dimension: 1200,
        quality: 0.7,
    };

    /// Images embedded in the report document itself.
    pub const INLINE: Self = Self {
        max_dimension: 600,
        quality: 0.5,
    };

    /// JPEG quality on the encoder's 1-100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Errors raised while compressing.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("not a base64 data URI")]
    NotDataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

impl CodecError {
    /// Whether the input itself was unreadable (as opposed to the encoder failing).
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Encode(_))
    }
}

/// Output of a successful compression.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// JPEG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl CompressedImage {
    /// Encode the JPEG bytes as a data URI.
    pub fn to_data_uri(&self) -> String {
        to_data_uri(OUTPUT_MIME, &self.bytes)
    }
}

/// Split a base64 data URI into its MIME type and decoded bytes.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), CodecError> {
    let rest = uri.strip_prefix(INLINE_PREFIX).ok_or(CodecError::NotDataUri)?;
    let (meta, data) = rest.split_once(',').ok_or(CodecError::NotDataUri)?;
    let mime = meta.strip_suffix(";base64").ok_or(CodecError::NotDataUri)?;

    let bytes = STANDARD.decode(data.trim())?;
    Ok((mime.to_string(), bytes))
}

/// Build a base64 data URI.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("{}{};base64,{}", INLINE_PREFIX, mime, STANDARD.encode(bytes))
}

/// Check an uploaded file's declared type and size before any decoding.
pub fn validate_upload(content_type: &str, size: u64, max_mb: u64) -> reportforge_common::Result<()> {
    let content_type = content_type.trim().to_ascii_lowercase();
    if !ALLOWED_UPLOAD_TYPES.contains(&content_type.as_str()) {
        return Err(Error::invalid_input(format!(
            "unsupported file type '{}', expected one of: {}",
            content_type,
            ALLOWED_UPLOAD_TYPES.join(", ")
        )));
    }

    let limit = max_mb.saturating_mul(1024 * 1024);
    if size > limit {
        return Err(Error::invalid_input(format!(
            "file is {} bytes, the limit is {} MB",
            size, max_mb
        )));
    }

    Ok(())
}

/// Dimensions that fit `width x height` inside `max_dimension` on the longer side.
///
/// Aspect ratio is preserved and images are never enlarged.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_dimension || max_dimension == 0 {
        return (width, height);
    }

    let scale = |side: u32| -> u32 {
        let scaled = (side as u64 * max_dimension as u64 + longer as u64 / 2) / longer as u64;
        scaled.max(1) as u32
    };

    if width >= height {
        (max_dimension, scale(height))
    } else {
        (scale(width), max_dimension)
    }
}

/// Decode, downsample, and re-encode raw image bytes as JPEG.
pub fn compress_bytes(data: &[u8], preset: CompressionPreset) -> Result<CompressedImage, CodecError> {
    let img = image::load_from_memory(data).map_err(CodecError::Decode)?;
    encode(img, preset)
}

fn encode(img: DynamicImage, preset: CompressionPreset) -> Result<CompressedImage, CodecError> {
    let (original_width, original_height) = (img.width(), img.height());
    let (width, height) = target_dimensions(original_width, original_height, preset.max_dimension);

    let img = if (width, height) != (original_width, original_height) {
        img.resize_exact(width, height, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut buf = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, preset.jpeg_quality());
    encoder.encode_image(&rgb).map_err(CodecError::Encode)?;

    Ok(CompressedImage {
        bytes: buf.into_inner(),
        width,
        height,
        original_width,
        original_height,
    })
}

/// Compress an inline payload.
///
/// Returns `Ok(None)` when the payload is not a decodable data URI; only a
/// failure to encode an image that did decode is an `Err`.
pub fn compress_inline(
    payload: &str,
    preset: CompressionPreset,
) -> Result<Option<String>, CodecError> {
    let decoded = parse_data_uri(payload).and_then(|(_, bytes)| compress_bytes(&bytes, preset));
    let compressed = match decoded {
        Ok(compressed) => compressed,
        Err(e) if e.is_input_error() => {
            warn!(error = %e, "Image payload is not decodable");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let output = compressed.to_data_uri();
    debug!(
        before_kb = payload.len() / 1024,
        after_kb = output.len() / 1024,
        width = compressed.width,
        height = compressed.height,
        "Image compressed"
    );
    Ok(Some(output))
}

/// Compress an inline payload, reporting encoder failures.
///
/// Input that is not a decodable data URI is returned unchanged as `Ok`.
pub fn try_compress(payload: &str, preset: CompressionPreset) -> Result<String, CodecError> {
    Ok(compress_inline(payload, preset)?.unwrap_or_else(|| payload.to_string()))
}

/// Compress an inline payload. Never fails: any error yields the original.
pub fn compress(payload: &str, preset: CompressionPreset) -> String {
    try_compress(payload, preset).unwrap_or_else(|e| {
        warn!(error = %e, "Image compression failed, keeping original");
        payload.to_string()
    })
}
