//! Uploading new images from raw files.
//!
//! Where an uploaded image ends up depends on the [`StorageMode`] picked at
//! startup: compressed into an inline data URI, or compressed harder and
//! pushed to the blob store under a content-hash name.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use reportforge_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::codec::{self, CompressionPreset, OUTPUT_MIME};
use crate::storage::BlobStore;

/// Default blob folder for report images.
pub const DEFAULT_UPLOAD_FOLDER: &str = "laporan";

/// Where newly uploaded images are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Embedded in the report as a data URI.
    #[default]
    Inline,
    /// Uploaded to the blob store and referenced by URL.
    Remote,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for StorageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "remote" => Ok(Self::Remote),
            other => Err(Error::invalid_input(format!("unknown storage mode '{}'", other))),
        }
    }
}

/// A file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Result of a multi-file upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSummary {
    /// References of the successful uploads, in input order.
    pub refs: Vec<String>,
    /// Number of files that failed.
    pub failed: usize,
}

/// Compresses and stores uploaded images.
pub struct ImageUploader {
    mode: StorageMode,
    blob: Option<Arc<dyn BlobStore>>,
    blob_preset: CompressionPreset,
    inline_preset: CompressionPreset,
    max_upload_mb: u64,
}

impl ImageUploader {
    /// Uploader storing images as inline data URIs.
    pub fn inline(inline_preset: CompressionPreset, max_upload_mb: u64) -> Self {
        Self {
            mode: StorageMode::Inline,
            blob: None,
            blob_preset: CompressionPreset::BLOB,
            inline_preset,
            max_upload_mb,
        }
    }

    /// Uploader pushing images to a blob store.
    pub fn remote(
        blob: Arc<dyn BlobStore>,
        blob_preset: CompressionPreset,
        max_upload_mb: u64,
    ) -> Self {
        Self {
            mode: StorageMode::Remote,
            blob: Some(blob),
            blob_preset,
            inline_preset: CompressionPreset::INLINE,
            max_upload_mb,
        }
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Validate, compress and store one file. Returns its image reference.
    ///
    /// A file that passes validation but does not decode is stored as-is
    /// under its declared content type.
    pub async fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<String> {
        codec::validate_upload(content_type, bytes.len() as u64, self.max_upload_mb)?;

        match (self.mode, &self.blob) {
            (StorageMode::Remote, Some(blob)) => {
                let (data, mime, ext) =
                    match compress_blocking(bytes.to_vec(), self.blob_preset).await? {
                        Some(jpeg) => (jpeg, OUTPUT_MIME, "jpg"),
                        None => (bytes.to_vec(), content_type, extension_for(content_type)),
                    };
                let path = blob_path(folder, bytes, file_name, ext);
                let url = blob.upload(data, &path, mime).await?;
                info!(path = %path, "Uploaded image to blob store");
                Ok(url)
            }
            (StorageMode::Remote, None) => {
                Err(Error::internal("remote storage selected without a blob store"))
            }
            (StorageMode::Inline, _) => {
                match compress_blocking(bytes.to_vec(), self.inline_preset).await? {
                    Some(jpeg) => Ok(codec::to_data_uri(OUTPUT_MIME, &jpeg)),
                    None => Ok(codec::to_data_uri(content_type, bytes)),
                }
            }
        }
    }

    /// Upload several files concurrently.
    ///
    /// Failed files are logged, counted and left out of the result.
    pub async fn upload_many(&self, files: &[UploadFile], folder: &str) -> UploadSummary {
        let results = join_all(files.iter().map(|file| {
            self.upload(&file.bytes, &file.file_name, &file.content_type, folder)
        }))
        .await;

        let mut summary = UploadSummary::default();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(reference) => summary.refs.push(reference),
                Err(e) => {
                    warn!(file = %file.file_name, error = %e, "Image upload failed");
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// JPEG bytes of the compressed file, or `None` when it does not decode.
async fn compress_blocking(bytes: Vec<u8>, preset: CompressionPreset) -> Result<Option<Vec<u8>>> {
    let result = tokio::task::spawn_blocking(move || codec::compress_bytes(&bytes, preset))
        .await
        .map_err(|e| Error::internal(format!("compression task failed: {}", e)))?;

    match result {
        Ok(compressed) => Ok(Some(compressed.bytes)),
        Err(e) if e.is_input_error() => {
            warn!(error = %e, "Upload is not decodable, storing original");
            Ok(None)
        }
        Err(e) => Err(Error::internal(e.to_string())),
    }
}

/// File extension for an accepted upload content type.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Content hash of an upload: the first 16 hex chars of its SHA-256.
fn compute_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(&digest[..8])
}

/// File stem reduced to `[A-Za-z0-9_-]`.
fn sanitize_file_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "image".to_string()
    } else {
        sanitized
    }
}

/// Blob path of an upload: `{folder}/{hash}_{name}.{ext}`.
fn blob_path(folder: &str, data: &[u8], file_name: &str, ext: &str) -> String {
    format!(
        "{}/{}_{}.{}",
        folder.trim_matches('/'),
        compute_hash(data),
        sanitize_file_name(file_name),
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([10, 120, 30]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[derive(Default)]
    struct RecordingBlobStore {
        paths: Mutex<Vec<String>>,
        uploads: Mutex<Vec<(Vec<u8>, String)>>,
    }

    #[async_trait]
    impl BlobStore for RecordingBlobStore {
        async fn upload(&self, bytes: Vec<u8>, path: &str, content_type: &str) -> Result<String> {
            self.paths.lock().unwrap().push(path.to_string());
            self.uploads
                .lock()
                .unwrap()
                .push((bytes, content_type.to_string()));
            Ok(format!("https://blob.example/{}", path))
        }
    }

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"test data");
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, compute_hash(b"test data"));
        assert_ne!(hash, compute_hash(b"other data"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Foto Kegiatan (1).PNG"), "Foto_Kegiatan__1_");
        assert_eq!(sanitize_file_name("scan.final.jpg"), "scan_final");
        assert_eq!(sanitize_file_name(".hidden"), "_hidden");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[test]
    fn test_blob_path_format() {
        let path = blob_path("/laporan/", b"abc", "photo.png", "jpg");
        let hash = compute_hash(b"abc");
        assert_eq!(path, format!("laporan/{}_photo.jpg", hash));
    }

    #[test]
    fn test_storage_mode_parse() {
        assert_eq!("inline".parse::<StorageMode>().unwrap(), StorageMode::Inline);
        assert_eq!("REMOTE".parse::<StorageMode>().unwrap(), StorageMode::Remote);
        assert!("s3".parse::<StorageMode>().is_err());
        assert_eq!(StorageMode::default(), StorageMode::Inline);
    }

    #[tokio::test]
    async fn test_inline_upload_returns_data_uri() {
        let uploader = ImageUploader::inline(CompressionPreset::INLINE, 5);
        let reference = uploader
            .upload(&png_bytes(900, 300), "a.png", "image/png", DEFAULT_UPLOAD_FOLDER)
            .await
            .unwrap();

        assert!(reference.starts_with("data:image/jpeg;base64,"));
        let (_, bytes) = codec::parse_data_uri(&reference).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (600, 200));
    }

    #[tokio::test]
    async fn test_remote_upload_uses_hashed_path() {
        let blob = Arc::new(RecordingBlobStore::default());
        let uploader = ImageUploader::remote(blob.clone(), CompressionPreset::BLOB, 5);
        let data = png_bytes(40, 40);

        let url = uploader
            .upload(&data, "rapat.png", "image/png", DEFAULT_UPLOAD_FOLDER)
            .await
            .unwrap();

        let expected = format!("laporan/{}_rapat.jpg", compute_hash(&data));
        assert_eq!(url, format!("https://blob.example/{}", expected));
        assert_eq!(*blob.paths.lock().unwrap(), vec![expected]);

        let uploads = blob.uploads.lock().unwrap();
        assert_eq!(uploads[0].1, "image/jpeg");
        assert!(uploads[0].0.starts_with(&[0xFF, 0xD8]));
    }

    #[tokio::test]
    async fn test_undecodable_inline_upload_keeps_original() {
        let uploader = ImageUploader::inline(CompressionPreset::INLINE, 5);
        let data = b"GIF89a-corrupt";

        let reference = uploader
            .upload(data, "a.gif", "image/gif", DEFAULT_UPLOAD_FOLDER)
            .await
            .unwrap();

        assert_eq!(reference, codec::to_data_uri("image/gif", data));
    }

    #[tokio::test]
    async fn test_undecodable_remote_upload_keeps_original() {
        let blob = Arc::new(RecordingBlobStore::default());
        let uploader = ImageUploader::remote(blob.clone(), CompressionPreset::BLOB, 5);
        let data = b"GIF89a-corrupt";

        let url = uploader
            .upload(data, "a.gif", "image/gif", DEFAULT_UPLOAD_FOLDER)
            .await
            .unwrap();

        let expected = format!("laporan/{}_a.gif", compute_hash(data));
        assert_eq!(url, format!("https://blob.example/{}", expected));

        let uploads = blob.uploads.lock().unwrap();
        assert_eq!(uploads[0].0, data.to_vec());
        assert_eq!(uploads[0].1, "image/gif");
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_type() {
        let uploader = ImageUploader::inline(CompressionPreset::INLINE, 5);
        let err = uploader
            .upload(b"%PDF-1.4", "doc.pdf", "application/pdf", DEFAULT_UPLOAD_FOLDER)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_upload_many_counts_failures() {
        let uploader = ImageUploader::inline(CompressionPreset::INLINE, 5);
        let files = vec![
            UploadFile {
                bytes: png_bytes(10, 10),
                file_name: "one.png".into(),
                content_type: "image/png".into(),
            },
            UploadFile {
                bytes: b"%PDF-1.4".to_vec(),
                file_name: "surat.pdf".into(),
                content_type: "application/pdf".into(),
            },
            UploadFile {
                bytes: png_bytes(20, 10),
                file_name: "two.png".into(),
                content_type: "image/png".into(),
            },
        ];

        let summary = uploader.upload_many(&files, DEFAULT_UPLOAD_FOLDER).await;
        assert_eq!(summary.refs.len(), 2);
        assert_eq!(summary.failed, 1);
    }
}
