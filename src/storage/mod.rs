//! Cloud Storage for Firebase module.
//!
//! Client for the Firebase Storage v0 REST API, the endpoint family the web
//! SDK uses. Supports uploading, downloading and deleting objects, object
//! metadata, prefix listing, and download URLs built from the v0 download
//! token.
//!
//! # Examples
//!
//! ```rust,ignore
//! # use firebase_client_sdk::FirebaseApp;
//! # async fn run(app: FirebaseApp) {
//! let storage = app.storage();
//! let bucket = storage.bucket(None); // configured default bucket
//!
//! let object = bucket.object("guides/set14/reroll.png").unwrap();
//! let url = object.download_url().await;
//! # }
//! ```

pub mod bucket;
pub mod object;


use crate::core::middleware::ApiKeyMiddleware;
use bucket::Bucket;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;

const STORAGE_V0_API: &str = "https://firebasestorage.googleapis.com/v0";

/// Errors that can occur during Storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Storage API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// The object path is empty or otherwise unusable.
    #[error("Invalid object path: {0}")]
    InvalidObjectPath(String),
    /// The object's metadata carries no download token.
    #[error("No download token on object: {0}")]
    NoDownloadToken(String),
}

/// Client for interacting with Cloud Storage for Firebase.
#[derive(Clone)]
pub struct FirebaseStorage {
    client: ClientWithMiddleware,
    base_url: String,
    default_bucket: String,
}

impl FirebaseStorage {
    /// Creates a new `FirebaseStorage` instance.
    ///
    /// This is typically called via `FirebaseApp::storage()`.
    pub fn new(middleware: ApiKeyMiddleware, default_bucket: &str) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware)
            .build();

        Self {
            client,
            base_url: STORAGE_V0_API.to_string(),
            default_bucket: default_bucket.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_with_client(
        client: ClientWithMiddleware,
        base_url: String,
        default_bucket: &str,
    ) -> Self {
        Self {
            client,
            base_url,
            default_bucket: default_bucket.to_string(),
        }
    }

    /// Gets a `Bucket` handle.
    ///
    /// # Arguments
    ///
    /// * `name` - The bucket name (e.g. "my-project.firebasestorage.app").
    ///            `None` uses the bucket from the app configuration.
    pub fn bucket(&self, name: Option<&str>) -> Bucket {
        let bucket_name = name.unwrap_or(&self.default_bucket).to_string();
        Bucket::new(self.client.clone(), self.base_url.clone(), bucket_name)
    }
}
