use crate::core::parse_error_response;
use crate::storage::object::StorageObject;
use crate::storage::StorageError;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

/// A reference to a Firebase Storage bucket.
pub struct Bucket {
    client: ClientWithMiddleware,
    base_url: String,
    name: String,
}

/// One page of a prefix listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    /// Sub-"directories" under the requested prefix.
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub items: Vec<ListItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub name: String,
    pub bucket: String,
}

impl Bucket {
    pub(crate) fn new(client: ClientWithMiddleware, base_url: String, name: String) -> Self {
        Self {
            client,
            base_url,
            name,
        }
    }

    /// Returns the name of the bucket.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a `StorageObject` for the object at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - The slash-separated path within the bucket
    ///            (e.g. "guides/set14/reroll.png").
    pub fn object(&self, path: &str) -> Result<StorageObject, StorageError> {
        if path.is_empty() || path.ends_with('/') {
            return Err(StorageError::InvalidObjectPath(format!(
                "object path must be non-empty and must not end with '/', got {:?}",
                path
            )));
        }
        Ok(StorageObject::new(
            self.client.clone(),
            self.base_url.clone(),
            self.name.clone(),
            path.to_string(),
        ))
    }

    /// Lists one page of objects under a prefix, using `/` as delimiter so
    /// nested paths come back as `prefixes` rather than flat items.
    pub async fn list(
        &self,
        prefix: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ListResult, StorageError> {
        let url = format!("{}/b/{}/o", self.base_url, self.name);

        let mut params = vec![("delimiter", "/".to_string())];
        if let Some(prefix) = prefix {
            params.push(("prefix", prefix.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(
                parse_error_response(response, "List objects failed").await,
            ));
        }

        Ok(response.json().await?)
    }
}
