//! File-store boundary: resolving a sticker file id to a retrieval location
//! and downloading the raw bytes.
//!
//! The production implementation talks to the Telegram Bot API; the service
//! layer only sees the [`FileStore`] trait so tests can substitute a fake.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConvertError;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Resolve an opaque file id to a location usable with [`download`].
    ///
    /// [`download`]: FileStore::download
    async fn resolve_location(&self, file_id: &str) -> Result<String, ConvertError>;

    /// Fetch the raw bytes behind a previously resolved location.
    async fn download(&self, location: &str) -> Result<Vec<u8>, ConvertError>;
}

/// Telegram Bot API file store.
///
/// `resolve_location` calls `getFile` and returns the `file_path` field;
/// `download` fetches `{base}/file/bot{token}/{file_path}`.
pub struct TelegramFileStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct GetFileResponse {
    ok: bool,
    description: Option<String>,
    result: Option<TelegramFile>,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    file_path: Option<String>,
}

impl TelegramFileStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl FileStore for TelegramFileStore {
    async fn resolve_location(&self, file_id: &str) -> Result<String, ConvertError> {
        let url = format!("{}/bot{}/getFile", self.base_url, self.token);
        let response = self
            .client
            .get(&url)
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| ConvertError::GetFile(e.to_string()))?;

        let body: GetFileResponse = response
            .json()
            .await
            .map_err(|e| ConvertError::GetFile(format!("malformed getFile response: {e}")))?;

        if !body.ok {
            let detail = body
                .description
                .unwrap_or_else(|| "getFile returned ok=false".to_owned());
            return Err(ConvertError::GetFile(detail));
        }
        let file_path = body
            .result
            .and_then(|f| f.file_path)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConvertError::GetFile("file path not available".to_owned()))?;

        debug!(file_id, file_path, "resolved sticker file location");
        Ok(file_path)
    }

    async fn download(&self, location: &str) -> Result<Vec<u8>, ConvertError> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, location);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConvertError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ConvertError::Download(format!(
                "file endpoint returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConvertError::Download(e.to_string()))?;

        debug!(location, len = bytes.len(), "downloaded sticker bytes");
        Ok(bytes.to_vec())
    }
}
