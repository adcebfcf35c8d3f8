//! Cloud Firestore module.
//!
//! Client for the Firestore v1 REST API against the project's `(default)`
//! database. Mirrors the web SDK's reference model: a
//! [`CollectionReference`](reference::CollectionReference) addresses a
//! collection, a [`DocumentReference`](reference::DocumentReference)
//! addresses a single document, and plain serde structs cross the boundary
//! in both directions.
//!
//! # Examples
//!
//! ```rust,ignore
//! # use firebase_client_sdk::FirebaseApp;
//! # use serde::Deserialize;
//! #[derive(Deserialize)]
//! struct Comp { name: String, tier: String }
//!
//! # async fn run(app: FirebaseApp) {
//! let db = app.firestore();
//! let comp: Comp = db.doc("comps/reroll-snipers").unwrap().get().await.unwrap();
//! # }
//! ```

pub mod models;
pub mod query;
pub mod reference;

#[cfg(test)]
mod tests;

use crate::core::middleware::ApiKeyMiddleware;
use query::Query;
use reference::{CollectionReference, DocumentReference};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;

const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents";

/// Errors that can occur during Firestore operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Firestore API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// The addressed document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// A collection id or document path is malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Client for interacting with Cloud Firestore.
#[derive(Clone)]
pub struct FirebaseFirestore {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseFirestore {
    /// Creates a new `FirebaseFirestore` instance bound to the project's
    /// `(default)` database.
    ///
    /// This is typically called via `FirebaseApp::firestore()`.
    pub fn new(middleware: ApiKeyMiddleware, project_id: &str) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware)
            .build();

        let base_url = FIRESTORE_V1_API.replace("{project_id}", project_id);

        Self { client, base_url }
    }

    #[cfg(test)]
    pub(crate) fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Gets a `CollectionReference` for a root collection.
    ///
    /// # Arguments
    ///
    /// * `collection_id` - The id of the collection (e.g. "comps").
    pub fn collection(&self, collection_id: &str) -> Result<CollectionReference, FirestoreError> {
        if collection_id.is_empty() || collection_id.contains('/') {
            return Err(FirestoreError::InvalidPath(format!(
                "collection id must be a single non-empty segment, got {:?}",
                collection_id
            )));
        }
        Ok(CollectionReference::new(
            self.client.clone(),
            format!("{}/{}", self.base_url, collection_id),
        ))
    }

    /// Gets a `DocumentReference` for a slash-separated document path
    /// (e.g. "comps/reroll-snipers").
    pub fn doc(&self, document_path: &str) -> Result<DocumentReference, FirestoreError> {
        let segments: Vec<&str> = document_path.split('/').collect();
        if segments.is_empty()
            || segments.len() % 2 != 0
            || segments.iter().any(|s| s.is_empty())
        {
            return Err(FirestoreError::InvalidPath(format!(
                "document path must have an even number of non-empty segments, got {:?}",
                document_path
            )));
        }
        Ok(DocumentReference::new(
            self.client.clone(),
            format!("{}/{}", self.base_url, document_path),
        ))
    }

    /// Starts a query over a root collection, executed via `:runQuery`.
    pub fn query(&self, collection_id: &str) -> Result<Query, FirestoreError> {
        Ok(self.collection(collection_id)?.query())
    }
}
