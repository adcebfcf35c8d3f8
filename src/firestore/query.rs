use super::models::{
    json_to_wire, CollectionSelector, CompositeFilterPayload, Document, FieldFilterPayload,
    FieldPath, FilterOp, OrderDirection, QueryFilter, QueryOrder, RunQueryRequest,
    RunQueryResponseItem, StructuredQuery,
};
use super::FirestoreError;
use crate::core::parse_error_response;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value as JsonValue;

/// Builder for a single-collection Firestore query, executed via
/// `:runQuery` against the collection's parent resource.
///
/// Filters combine with AND. Values are plain JSON and converted to wire
/// values when the query runs.
pub struct Query {
    client: ClientWithMiddleware,
    parent: String,
    collection_id: String,
    filters: Vec<(String, FilterOp, JsonValue)>,
    order: Vec<(String, OrderDirection)>,
    limit: Option<i32>,
}

impl Query {
    pub(crate) fn new(client: ClientWithMiddleware, parent: String, collection_id: String) -> Self {
        Self {
            client,
            parent,
            collection_id,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Adds a field filter, e.g. `.filter("tier", FilterOp::Equal, "S")`.
    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<JsonValue>) -> Self {
        self.filters.push((field.to_string(), op, value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: OrderDirection) -> Self {
        self.order.push((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn build(self) -> Result<(ClientWithMiddleware, String, RunQueryRequest), FirestoreError> {
        let mut filters = Vec::with_capacity(self.filters.len());
        for (field, op, value) in self.filters {
            filters.push(QueryFilter::FieldFilter(FieldFilterPayload {
                field: FieldPath { field_path: field },
                op,
                value: json_to_wire(value)?,
            }));
        }

        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(QueryFilter::CompositeFilter(CompositeFilterPayload {
                op: "AND".to_string(),
                filters,
            })),
        };

        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: self.collection_id,
                }],
                filter,
                order_by: self
                    .order
                    .into_iter()
                    .map(|(field, direction)| QueryOrder {
                        field: FieldPath { field_path: field },
                        direction,
                    })
                    .collect(),
                limit: self.limit,
            },
        };

        Ok((self.client, self.parent, request))
    }

    /// Executes the query and returns the matching documents.
    pub async fn run(self) -> Result<Vec<Document>, FirestoreError> {
        let (client, parent, request) = self.build()?;
        let url = format!("{}:runQuery", parent);

        let response = client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Run query failed").await,
            ));
        }

        let items: Vec<RunQueryResponseItem> = response.json().await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }
}
