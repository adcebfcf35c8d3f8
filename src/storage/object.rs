use crate::core::parse_error_response;
use crate::storage::StorageError;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::HashMap;

/// Represents a single object within a Firebase Storage bucket.
pub struct StorageObject {
    client: ClientWithMiddleware,
    base_url: String,
    bucket: String,
    path: String,
}

/// Object metadata in the Firebase Storage v0 format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub name: Option<String>,
    pub bucket: Option<String>,
    pub generation: Option<String>,
    pub metageneration: Option<String>,
    pub content_type: Option<String>,
    pub time_created: Option<String>,
    pub updated: Option<String>,
    /// Size in bytes, as a decimal string.
    pub size: Option<String>,
    pub md5_hash: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub cache_control: Option<String>,
    /// Custom key/value metadata.
    pub metadata: Option<HashMap<String, String>>,
    /// Comma-separated download tokens; the first one builds the public
    /// download URL.
    pub download_tokens: Option<String>,
}

impl StorageObject {
    pub(crate) fn new(
        client: ClientWithMiddleware,
        base_url: String,
        bucket: String,
        path: String,
    ) -> Self {
        Self {
            client,
            base_url,
            bucket,
            path,
        }
    }

    /// Returns the object path within the bucket.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the name of the bucket containing the object.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    // The v0 API addresses objects by their fully-encoded path, slashes
    // included.
    fn object_url(&self) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(self.path.as_bytes()).collect();
        format!("{}/b/{}/o/{}", self.base_url, self.bucket, encoded)
    }

    /// Uploads data to the object path (simple, non-resumable upload).
    ///
    /// # Arguments
    ///
    /// * `body` - The data to upload.
    /// * `content_type` - The MIME type of the data.
    pub async fn upload(
        &self,
        body: impl Into<reqwest::Body>,
        content_type: &str,
    ) -> Result<ObjectMetadata, StorageError> {
        let url = format!("{}/b/{}/o", self.base_url, self.bucket);

        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", &self.path)])
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(
                parse_error_response(response, "Upload failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Downloads the object's content.
    pub async fn download(&self) -> Result<bytes::Bytes, StorageError> {
        let response = self
            .client
            .get(self.object_url())
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(
                parse_error_response(response, "Download failed").await,
            ));
        }

        Ok(response.bytes().await?)
    }

    /// Fetches the object's metadata.
    pub async fn get_metadata(&self) -> Result<ObjectMetadata, StorageError> {
        let response = self.client.get(self.object_url()).send().await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(
                parse_error_response(response, "Get metadata failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Deletes the object.
    pub async fn delete(&self) -> Result<(), StorageError> {
        let response = self.client.delete(self.object_url()).send().await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(
                parse_error_response(response, "Delete failed").await,
            ));
        }

        Ok(())
    }

    /// Builds the public download URL from the object's v0 download token,
    /// the same URL the web SDK's `getDownloadURL` returns.
    pub async fn download_url(&self) -> Result<String, StorageError> {
        let metadata = self.get_metadata().await?;
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StorageError::NoDownloadToken(self.path.clone()))?;

        Ok(format!("{}?alt=media&token={}", self.object_url(), token))
    }
}
