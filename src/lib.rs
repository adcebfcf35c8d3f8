//! Firebase client SDK for Rust.
//!
//! Builds a [`FirebaseApp`] handle from an immutable project configuration
//! and hands out bound clients for Firebase Authentication, Cloud Firestore,
//! Cloud Storage and Google Analytics. The handle is a plain value: the host
//! application constructs it once and threads it through its own component
//! graph, there is no global registry.
//!
//! # Examples
//!
//! ```rust,ignore
//! use firebase_client_sdk::FirebaseApp;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let app = FirebaseApp::from_env()?;
//!
//! let auth = app.auth();
//! let db = app.firestore();
//! let storage = app.storage();
//! let analytics = app.analytics();
//!
//! auth.sign_in_with_password("player@example.com", "hunter2").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;

#[cfg(feature = "analytics")]
pub mod analytics;
#[cfg(feature = "auth")]
pub mod auth;
#[cfg(feature = "firestore")]
pub mod firestore;
#[cfg(feature = "storage")]
pub mod storage;

#[cfg(feature = "analytics")]
use analytics::FirebaseAnalytics;
#[cfg(feature = "auth")]
use auth::FirebaseAuth;
use crate::core::middleware::ApiKeyMiddleware;
#[cfg(feature = "firestore")]
use firestore::FirebaseFirestore;
#[cfg(feature = "storage")]
use storage::FirebaseStorage;

pub use config::{ConfigError, FirebaseConfig};

/// Application-context handle binding a validated [`FirebaseConfig`] to the
/// shared request middleware.
///
/// Cheap to construct and side-effect free; initializing twice with the same
/// configuration yields two equivalent, independently usable handles.
pub struct FirebaseApp {
    config: FirebaseConfig,
    middleware: ApiKeyMiddleware,
}

impl FirebaseApp {
    /// Validates the configuration and builds the handle.
    pub fn initialize(config: FirebaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let middleware = ApiKeyMiddleware::new(config.api_key.clone());
        tracing::debug!(project_id = %config.project_id, "firebase app initialized");
        Ok(Self { config, middleware })
    }

    /// Loads the configuration from `FIREBASE_*` environment variables and
    /// initializes the handle.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::initialize(FirebaseConfig::from_env()?)
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    /// Client for Firebase Authentication (Identity Toolkit).
    ///
    /// Signing in through this client publishes the user's id token to the
    /// session shared with the other service clients.
    #[cfg(feature = "auth")]
    pub fn auth(&self) -> FirebaseAuth {
        FirebaseAuth::new(self.middleware.clone())
    }

    /// Client for Cloud Firestore, bound to the `(default)` database of the
    /// configured project.
    #[cfg(feature = "firestore")]
    pub fn firestore(&self) -> FirebaseFirestore {
        FirebaseFirestore::new(self.middleware.clone(), &self.config.project_id)
    }

    /// Client for Cloud Storage, defaulting to the configured bucket.
    #[cfg(feature = "storage")]
    pub fn storage(&self) -> FirebaseStorage {
        FirebaseStorage::new(self.middleware.clone(), &self.config.storage_bucket)
    }

    /// Client for Google Analytics (GA4 Measurement Protocol), bound to the
    /// configured measurement id and app id.
    #[cfg(feature = "analytics")]
    pub fn analytics(&self) -> FirebaseAnalytics {
        FirebaseAnalytics::new(&self.config.measurement_id, &self.config.app_id)
    }
}
