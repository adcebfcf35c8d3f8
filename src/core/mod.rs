pub mod middleware;

use serde::Deserialize;

/// Standard Google API error envelope returned by the Identity Toolkit,
/// Firestore and Storage endpoints.
#[derive(Debug, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
    pub errors: Option<Vec<GoogleErrorItem>>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorItem {
    pub message: String,
    pub domain: Option<String>,
    pub reason: Option<String>,
}

impl GoogleErrorResponse {
    /// First whitespace-delimited token of the message. The Identity Toolkit
    /// puts the machine-readable code there (`EMAIL_EXISTS`,
    /// `INVALID_PASSWORD : ...`).
    pub fn code_token(&self) -> &str {
        self.error
            .message
            .split_whitespace()
            .next()
            .unwrap_or_default()
    }

    pub fn summary(&self) -> String {
        format!("{} (code: {})", self.error.message, self.error.code)
    }
}

/// Reads a non-success response body as a Google error envelope, falling
/// back to the HTTP status when the body is not the expected JSON.
pub async fn parse_error_response(response: reqwest::Response, default_msg: &str) -> String {
    let status = response.status();
    match response.json::<GoogleErrorResponse>().await {
        Ok(envelope) => envelope.summary(),
        Err(_) => format!("{}: {}", default_msg, status),
    }
}
