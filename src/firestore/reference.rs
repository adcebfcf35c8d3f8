use super::models::{to_wire_fields, Document, FieldValue, ListDocumentsResponse};
use super::query::Query;
use super::FirestoreError;
use crate::core::parse_error_response;
use reqwest::{header, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct WriteBody {
    fields: BTreeMap<String, FieldValue>,
}

/// A reference to a Firestore collection.
#[derive(Clone)]
pub struct CollectionReference {
    client: ClientWithMiddleware,
    path: String,
}

impl CollectionReference {
    pub(crate) fn new(client: ClientWithMiddleware, path: String) -> Self {
        Self { client, path }
    }

    /// The collection id (last path segment).
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Gets a `DocumentReference` for a document inside this collection.
    pub fn doc(&self, document_id: &str) -> Result<DocumentReference, FirestoreError> {
        if document_id.is_empty() || document_id.contains('/') {
            return Err(FirestoreError::InvalidPath(format!(
                "document id must be a single non-empty segment, got {:?}",
                document_id
            )));
        }
        Ok(DocumentReference::new(
            self.client.clone(),
            format!("{}/{}", self.path, document_id),
        ))
    }

    /// Creates a document with a server-assigned id and returns it.
    pub async fn add<T: Serialize>(&self, value: &T) -> Result<Document, FirestoreError> {
        let body = WriteBody {
            fields: to_wire_fields(value)?,
        };

        let response = self
            .client
            .post(&self.path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Add document failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Lists one page of documents in the collection.
    ///
    /// Pass the previous response's `next_page_token` to fetch the next
    /// page; an absent token in the response means the listing is complete.
    pub async fn list(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse, FirestoreError> {
        let mut params = vec![("pageSize", page_size.to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self.client.get(&self.path).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "List documents failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Starts a query over this collection.
    pub fn query(&self) -> Query {
        let (parent, collection_id) = match self.path.rsplit_once('/') {
            Some((parent, id)) => (parent.to_string(), id.to_string()),
            None => (self.path.clone(), String::new()),
        };
        Query::new(self.client.clone(), parent, collection_id)
    }
}

/// A reference to a single Firestore document.
#[derive(Clone)]
pub struct DocumentReference {
    client: ClientWithMiddleware,
    path: String,
}

impl DocumentReference {
    pub(crate) fn new(client: ClientWithMiddleware, path: String) -> Self {
        Self { client, path }
    }

    /// The document id (last path segment).
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Gets a `CollectionReference` for a subcollection of this document.
    pub fn collection(&self, collection_id: &str) -> Result<CollectionReference, FirestoreError> {
        if collection_id.is_empty() || collection_id.contains('/') {
            return Err(FirestoreError::InvalidPath(format!(
                "collection id must be a single non-empty segment, got {:?}",
                collection_id
            )));
        }
        Ok(CollectionReference::new(
            self.client.clone(),
            format!("{}/{}", self.path, collection_id),
        ))
    }

    /// Fetches the raw document.
    pub async fn get_document(&self) -> Result<Document, FirestoreError> {
        let response = self.client.get(&self.path).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FirestoreError::NotFound(self.path.clone()));
        }
        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Get document failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Fetches the document and deserializes its fields.
    pub async fn get<T: DeserializeOwned>(&self) -> Result<T, FirestoreError> {
        let document = self.get_document().await?;
        Ok(document.data()?)
    }

    /// Writes the full document, creating it if absent and replacing every
    /// field if present (the web SDK's `setDoc`).
    pub async fn set<T: Serialize>(&self, value: &T) -> Result<Document, FirestoreError> {
        let body = WriteBody {
            fields: to_wire_fields(value)?,
        };

        let response = self
            .client
            .patch(&self.path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Set document failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Patches only the named fields of an existing document (the web SDK's
    /// `updateDoc`): sends an update mask and requires the document to
    /// exist.
    pub async fn update<T: Serialize>(
        &self,
        value: &T,
        field_paths: &[&str],
    ) -> Result<Document, FirestoreError> {
        let body = WriteBody {
            fields: to_wire_fields(value)?,
        };

        let mut params = vec![("currentDocument.exists", "true".to_string())];
        for field in field_paths {
            params.push(("updateMask.fieldPaths", field.to_string()));
        }

        let response = self
            .client
            .patch(&self.path)
            .query(&params)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FirestoreError::NotFound(self.path.clone()));
        }
        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Update document failed").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Deletes the document. Deleting an absent document succeeds.
    pub async fn delete(&self) -> Result<(), FirestoreError> {
        let response = self.client.delete(&self.path).send().await?;

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Delete document failed").await,
            ));
        }

        Ok(())
    }
}
