//! HTTP-backed store implementations.
//!
//! Both stores talk plain REST with `reqwest`. Transport failures and non-2xx
//! responses surface as `Error::Unavailable`.

use std::time::Duration;

use async_trait::async_trait;
use reportforge_common::{Error, Result};
use reportforge_db::models::LegacyImageRecord;
use serde::Deserialize;
use tracing::debug;

use super::{BlobStore, LegacyImageStore};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::internal(format!("failed to build HTTP client: {}", e)))
}

fn unavailable(context: &str, err: reqwest::Error) -> Error {
    Error::unavailable(format!("{}: {}", context, err))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    download_url: Option<String>,
}

/// [`BlobStore`] that `PUT`s files to `{base_url}/{path}`.
///
/// The returned URL is the `downloadUrl` field of the JSON response when the
/// server sends one, otherwise `{public_base_url}/{path}`.
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    public_base_url: String,
}

impl HttpBlobStore {
    /// Create a store. `public_base_url` defaults to `base_url`.
    pub fn new(base_url: impl Into<String>, public_base_url: Option<String>) -> Result<Self> {
        let base_url = base_url.into();
        let public_base_url = public_base_url.unwrap_or_else(|| base_url.clone());
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            base_url,
            public_base_url,
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: Vec<u8>, path: &str, content_type: &str) -> Result<String> {
        let url = join_url(&self.base_url, path);
        debug!(url = %url, size = bytes.len(), "Uploading blob");

        let resp = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| unavailable("blob upload failed", e))?
            .error_for_status()
            .map_err(|e| unavailable("blob upload rejected", e))?;

        let download_url = resp
            .json::<UploadResponse>()
            .await
            .ok()
            .and_then(|body| body.download_url)
            .filter(|u| !u.is_empty());

        Ok(download_url.unwrap_or_else(|| join_url(&self.public_base_url, path)))
    }
}

// ---------------------------------------------------------------------------
// Legacy image store
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// [`LegacyImageStore`] over the REST interface of the legacy database.
///
/// Records live at `{base_url}/{collection}/{key}.json`; a `null` body
/// means the key is absent.
pub struct HttpLegacyStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLegacyStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl LegacyImageStore for HttpLegacyStore {
    async fn write(&self, collection: &str, record: LegacyImageRecord) -> Result<String> {
        let url = join_url(&self.base_url, &format!("{}.json", collection));

        let resp = self
            .client
            .post(&url)
            .json(&record)
            .send()
            .await
            .map_err(|e| unavailable("legacy write failed", e))?
            .error_for_status()
            .map_err(|e| unavailable("legacy write rejected", e))?;

        let body: PushResponse = resp
            .json()
            .await
            .map_err(|e| unavailable("legacy write returned no key", e))?;
        Ok(body.name)
    }

    async fn read(&self, collection: &str, key: &str) -> Result<Option<LegacyImageRecord>> {
        let url = join_url(&self.base_url, &format!("{}/{}.json", collection, key));
        debug!(url = %url, "Reading legacy image");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable("legacy read failed", e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = resp
            .error_for_status()
            .map_err(|e| unavailable("legacy read rejected", e))?;

        resp.json::<Option<LegacyImageRecord>>()
            .await
            .map_err(|e| Error::invalid_input(format!("malformed legacy record '{}': {}", key, e)))
    }
}
