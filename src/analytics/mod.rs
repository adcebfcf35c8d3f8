//! Google Analytics module.
//!
//! Client for the GA4 Measurement Protocol, bound to the configured
//! measurement id. Events are validated locally (name shape, reserved
//! prefixes, batch size) before anything goes on the wire, since the collect
//! endpoint accepts malformed payloads silently.
//!
//! The Measurement Protocol requires an API secret in addition to the
//! measurement id; without one, logging returns
//! [`AnalyticsError::NoApiSecret`] instead of sending a request the backend
//! would drop.
//!
//! # Examples
//!
//! ```rust,ignore
//! # use firebase_client_sdk::FirebaseApp;
//! # use serde_json::json;
//! # async fn run(app: FirebaseApp) {
//! let analytics = app.analytics().with_api_secret("secret");
//!
//! let _ = analytics
//!     .log_event("guide_opened", json!({"guide_id": "reroll-snipers"}))
//!     .await;
//! # }
//! ```

#[cfg(test)]
mod tests;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

const MEASUREMENT_API: &str = "https://www.google-analytics.com/mp/collect";

/// Hard limit of the Measurement Protocol.
const MAX_EVENTS_PER_BATCH: usize = 25;
const MAX_EVENT_NAME_LEN: usize = 40;
const RESERVED_PREFIXES: [&str; 3] = ["google_", "ga_", "firebase_"];

/// Errors that can occur during Analytics operations.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// The collect endpoint returned an error status code.
    #[error("API error: {0}")]
    Api(StatusCode),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// The event name violates the GA4 naming rules.
    #[error("Invalid event name: {0}")]
    InvalidEventName(String),
    /// Event params must be a JSON object.
    #[error("Event params must be a JSON object, got: {0}")]
    InvalidParams(String),
    /// More events than the protocol accepts in one request.
    #[error("Batch of {0} events exceeds the protocol limit of 25")]
    TooManyEvents(usize),
    /// No API secret configured; see `with_api_secret`.
    #[error("No Measurement Protocol API secret configured")]
    NoApiSecret,
}

#[derive(Serialize)]
struct EventPayload {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<JsonValue>,
}

#[derive(Serialize)]
struct UserPropertyPayload {
    value: JsonValue,
}

#[derive(Serialize)]
struct CollectPayload {
    client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    timestamp_micros: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    user_properties: BTreeMap<String, UserPropertyPayload>,
    events: Vec<EventPayload>,
}

/// Client for logging events to Google Analytics.
pub struct FirebaseAnalytics {
    client: ClientWithMiddleware,
    endpoint: String,
    measurement_id: String,
    api_secret: Option<String>,
    client_id: String,
    user_id: Option<String>,
    user_properties: BTreeMap<String, JsonValue>,
}

impl FirebaseAnalytics {
    /// Creates a new `FirebaseAnalytics` instance.
    ///
    /// This is typically called via `FirebaseApp::analytics()`. The collect
    /// endpoint does not take the Firebase API key, so this client carries
    /// only the retry middleware.
    pub fn new(measurement_id: &str, app_id: &str) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            endpoint: MEASUREMENT_API.to_string(),
            measurement_id: measurement_id.to_string(),
            api_secret: None,
            client_id: derive_client_id(app_id),
            user_id: None,
            user_properties: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_with_client(
        client: ClientWithMiddleware,
        endpoint: String,
        measurement_id: &str,
        app_id: &str,
    ) -> Self {
        Self {
            client,
            endpoint,
            measurement_id: measurement_id.to_string(),
            api_secret: None,
            client_id: derive_client_id(app_id),
            user_id: None,
            user_properties: BTreeMap::new(),
        }
    }

    /// Sets the Measurement Protocol API secret for the configured stream.
    pub fn with_api_secret(mut self, api_secret: &str) -> Self {
        self.api_secret = Some(api_secret.to_string());
        self
    }

    /// Stable per-app client id sent with every payload.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Attaches a user id to subsequent payloads; `None` detaches it.
    pub fn set_user_id(&mut self, user_id: Option<&str>) {
        self.user_id = user_id.map(str::to_string);
    }

    /// Sets a user property carried on subsequent payloads.
    pub fn set_user_property(&mut self, name: &str, value: impl Into<JsonValue>) {
        self.user_properties.insert(name.to_string(), value.into());
    }

    /// Logs a single event. `params` must be a JSON object or `null`.
    pub async fn log_event(&self, name: &str, params: JsonValue) -> Result<(), AnalyticsError> {
        self.log_events(vec![(name.to_string(), params)]).await
    }

    /// Logs a batch of up to 25 events in one request.
    pub async fn log_events(
        &self,
        events: Vec<(String, JsonValue)>,
    ) -> Result<(), AnalyticsError> {
        if events.is_empty() {
            return Ok(());
        }
        if events.len() > MAX_EVENTS_PER_BATCH {
            return Err(AnalyticsError::TooManyEvents(events.len()));
        }

        let mut payload_events = Vec::with_capacity(events.len());
        for (name, params) in events {
            validate_event_name(&name)?;
            let params = match params {
                JsonValue::Null => None,
                value @ JsonValue::Object(_) => Some(value),
                other => return Err(AnalyticsError::InvalidParams(other.to_string())),
            };
            payload_events.push(EventPayload { name, params });
        }

        let Some(api_secret) = self.api_secret.as_deref() else {
            tracing::debug!(
                measurement_id = %self.measurement_id,
                "dropping analytics batch: no API secret configured"
            );
            return Err(AnalyticsError::NoApiSecret);
        };

        let payload = CollectPayload {
            client_id: self.client_id.clone(),
            user_id: self.user_id.clone(),
            timestamp_micros: Utc::now().timestamp_micros(),
            user_properties: self
                .user_properties
                .iter()
                .map(|(name, value)| {
                    (
                        name.clone(),
                        UserPropertyPayload {
                            value: value.clone(),
                        },
                    )
                })
                .collect(),
            events: payload_events,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("measurement_id", self.measurement_id.as_str()),
                ("api_secret", api_secret),
            ])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalyticsError::Api(response.status()));
        }

        tracing::debug!(count = payload.events.len(), "analytics batch sent");
        Ok(())
    }
}

// GA4 allows colons in none of its ids; the app id's `:` separators become
// dots so the derived client id stays stable per app.
fn derive_client_id(app_id: &str) -> String {
    app_id.replace(':', ".")
}

fn validate_event_name(name: &str) -> Result<(), AnalyticsError> {
    if name.is_empty() || name.len() > MAX_EVENT_NAME_LEN {
        return Err(AnalyticsError::InvalidEventName(format!(
            "{:?} must be 1..={} characters",
            name, MAX_EVENT_NAME_LEN
        )));
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap_or_default();
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AnalyticsError::InvalidEventName(format!(
            "{:?} must start with a letter and contain only letters, digits and underscores",
            name
        )));
    }

    if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| name.starts_with(*p)) {
        return Err(AnalyticsError::InvalidEventName(format!(
            "{:?} uses the reserved prefix {:?}",
            name, prefix
        )));
    }

    Ok(())
}
