//! Firebase Authentication module.
//!
//! Client for the Identity Toolkit and Secure Token REST APIs, covering the
//! email/password and anonymous sign-in surface of the web SDK. A successful
//! sign-in publishes the user's id token to the session shared with the
//! Firestore and Storage clients, which then send it as a bearer token.

pub mod models;


use crate::core::middleware::{ApiKeyMiddleware, SessionStore};
use crate::core::GoogleErrorResponse;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::sync::Arc;
use thiserror::Error;

use models::{
    CredentialRequest, IdTokenClaims, LookupRequest, LookupResponse, OobCodeRequest,
    OobCodeResponse, RefreshGrant, TokenGrant, UserCredential, UserRecord,
};

const IDENTITY_TOOLKIT_V1_API: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_V1_API: &str = "https://securetoken.googleapis.com/v1";

/// Errors that can occur during Authentication operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Error returned by the Identity Toolkit, with its machine-readable
    /// code (`EMAIL_EXISTS`, `INVALID_PASSWORD`, ...).
    #[error("Identity Toolkit error {code}: {message}")]
    Api { code: String, message: String },
    /// No account matches the given credentials or identifier.
    #[error("User not found")]
    UserNotFound,
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// The id token is not a well-formed JWT.
    #[error("Malformed id token")]
    MalformedToken,
}

/// Client for Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    base_url: String,
    token_url: String,
    session: Arc<SessionStore>,
}

impl FirebaseAuth {
    /// Creates a new `FirebaseAuth` instance.
    ///
    /// This is typically called via `FirebaseApp::auth()`.
    pub fn new(middleware: ApiKeyMiddleware) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let session = middleware.session();
        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware)
            .build();

        Self {
            client,
            base_url: IDENTITY_TOOLKIT_V1_API.to_string(),
            token_url: SECURE_TOKEN_V1_API.to_string(),
            session,
        }
    }

    /// Creates an instance against a custom endpoint, with both APIs rooted
    /// at `base_url`. Internal use only, primarily for testing.
    #[cfg(test)]
    pub(crate) fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self {
            client,
            token_url: base_url.clone(),
            base_url,
            session: Arc::new(SessionStore::default()),
        }
    }

    async fn api_error(response: reqwest::Response, default_msg: &str) -> AuthError {
        let status = response.status();
        match response.json::<GoogleErrorResponse>().await {
            Ok(envelope) => {
                let code = envelope.code_token().to_string();
                if code == "EMAIL_NOT_FOUND" || code == "USER_NOT_FOUND" {
                    return AuthError::UserNotFound;
                }
                AuthError::Api {
                    code,
                    message: envelope.error.message,
                }
            }
            Err(_) => AuthError::Api {
                code: status.as_u16().to_string(),
                message: default_msg.to_string(),
            },
        }
    }

    async fn request_token(
        &self,
        endpoint: &str,
        request: CredentialRequest,
        default_msg: &str,
    ) -> Result<TokenGrant, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, default_msg).await);
        }

        Ok(response.json().await?)
    }

    async fn establish_session(&self, credential: &UserCredential) {
        self.session.set(credential.id_token.clone()).await;
        tracing::debug!(uid = %credential.uid, "user session established");
    }

    /// Creates a new email/password account and signs it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserCredential, AuthError> {
        let request = CredentialRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            return_secure_token: true,
        };
        let grant = self.request_token("signUp", request, "Sign up failed").await?;
        let credential = UserCredential::from_grant(grant, false);
        self.establish_session(&credential).await;
        Ok(credential)
    }

    /// Signs in an existing account with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserCredential, AuthError> {
        let request = CredentialRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            return_secure_token: true,
        };
        let grant = self
            .request_token("signInWithPassword", request, "Sign in failed")
            .await?;
        let credential = UserCredential::from_grant(grant, false);
        self.establish_session(&credential).await;
        Ok(credential)
    }

    /// Signs in as a new anonymous user.
    pub async fn sign_in_anonymously(&self) -> Result<UserCredential, AuthError> {
        let request = CredentialRequest {
            return_secure_token: true,
            ..Default::default()
        };
        let grant = self
            .request_token("signUp", request, "Anonymous sign in failed")
            .await?;
        let credential = UserCredential::from_grant(grant, true);
        self.establish_session(&credential).await;
        Ok(credential)
    }

    /// Exchanges a refresh token for a fresh id token and republishes it to
    /// the shared session.
    pub async fn refresh_id_token(
        &self,
        refresh_token: &str,
    ) -> Result<UserCredential, AuthError> {
        let url = format!("{}/token", self.token_url);
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "Token refresh failed").await);
        }

        let grant: RefreshGrant = response.json().await?;
        let credential = UserCredential::from_refresh_grant(grant);
        self.establish_session(&credential).await;
        Ok(credential)
    }

    /// Fetches the account record behind an id token via `accounts:lookup`.
    pub async fn get_account_info(&self, id_token: &str) -> Result<UserRecord, AuthError> {
        let url = format!("{}/accounts:lookup", self.base_url);
        let request = LookupRequest {
            id_token: id_token.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "Account lookup failed").await);
        }

        let result: LookupResponse = response.json().await?;
        result
            .users
            .and_then(|mut users| users.pop())
            .ok_or(AuthError::UserNotFound)
    }

    /// Sends a password-reset email via `accounts:sendOobCode`.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/accounts:sendOobCode", self.base_url);
        let request = OobCodeRequest {
            request_type: "PASSWORD_RESET".to_string(),
            email: email.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "Password reset failed").await);
        }

        let _: OobCodeResponse = response.json().await?;
        Ok(())
    }

    /// Clears the shared session; subsequent service requests carry only the
    /// API key.
    pub async fn sign_out(&self) {
        self.session.clear().await;
        tracing::debug!("user session cleared");
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.is_signed_in().await
    }
}

/// Decodes the payload claims of a Firebase id token.
///
/// The signature is NOT verified; this is the client-side convenience the
/// web SDK offers for reading the current user's uid and expiry, nothing
/// more. Backends must verify tokens against Google's public keys.
pub fn decode_token_claims(id_token: &str) -> Result<IdTokenClaims, AuthError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or(AuthError::MalformedToken)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;
    Ok(serde_json::from_slice(&bytes)?)
}
