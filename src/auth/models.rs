use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `accounts:signUp` and `accounts:signInWithPassword`.
///
/// Anonymous sign-up sends neither email nor password.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub return_secure_token: bool,
}

/// Token grant returned by `accounts:signUp` / `accounts:signInWithPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub id_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds, sent as a decimal string.
    pub expires_in: String,
    pub local_id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub registered: bool,
}

/// Token grant returned by the Secure Token API. Unlike the Identity
/// Toolkit, this endpoint responds in snake_case.
#[derive(Debug, Deserialize)]
pub struct RefreshGrant {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
    pub user_id: String,
}

/// Signed-in user session handed back to the caller.
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Absolute expiry computed from the grant's `expires_in`.
    pub expires_at: DateTime<Utc>,
    pub is_anonymous: bool,
}

fn expiry_from_seconds(expires_in: &str) -> DateTime<Utc> {
    let seconds = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(seconds)
}

impl UserCredential {
    pub(crate) fn from_grant(grant: TokenGrant, is_anonymous: bool) -> Self {
        Self {
            uid: grant.local_id,
            email: grant.email,
            expires_at: expiry_from_seconds(&grant.expires_in),
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
            is_anonymous,
        }
    }

    pub(crate) fn from_refresh_grant(grant: RefreshGrant) -> Self {
        Self {
            uid: grant.user_id,
            email: None,
            expires_at: expiry_from_seconds(&grant.expires_in),
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
            is_anonymous: false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub users: Option<Vec<UserRecord>>,
}

/// Account record returned by `accounts:lookup`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub local_id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Creation timestamp in epoch milliseconds, as a string.
    pub created_at: Option<String>,
    /// Last sign-in timestamp in epoch milliseconds, as a string.
    pub last_login_at: Option<String>,
    pub provider_user_info: Option<Vec<ProviderUserInfo>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUserInfo {
    pub provider_id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub federated_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OobCodeRequest {
    pub request_type: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OobCodeResponse {
    pub email: Option<String>,
}

/// Claims carried in the payload segment of a Firebase id token.
///
/// Decoded without signature verification; see
/// [`decode_token_claims`](crate::auth::decode_token_claims).
#[derive(Debug, Deserialize)]
pub struct IdTokenClaims {
    /// Audience, which Firebase sets to the project id.
    pub aud: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub user_id: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}
