use http::Extensions;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holder for the signed-in user's id token, shared between the auth client
/// (writer) and every service request (reader).
#[derive(Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub async fn set(&self, id_token: String) {
        *self.token.write().await = Some(id_token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn id_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.token.read().await.is_some()
    }
}

/// Request middleware that attaches the web API key as the `key` query
/// parameter and, once a user is signed in, the id token as a bearer token.
#[derive(Clone)]
pub struct ApiKeyMiddleware {
    api_key: String,
    session: Arc<SessionStore>,
}

impl ApiKeyMiddleware {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            session: Arc::new(SessionStore::default()),
        }
    }

    /// The session shared by every client built from this middleware.
    pub fn session(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session)
    }
}

#[async_trait::async_trait]
impl Middleware for ApiKeyMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair("key", &self.api_key);

        if let Some(token) = self.session.id_token().await {
            let value =
                header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                    reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                        "id token is not a valid header value: {}",
                        e
                    ))
                })?;
            req.headers_mut().insert(header::AUTHORIZATION, value);
        }

        tracing::trace!(path = %req.url().path(), "dispatching request");
        next.run(req, extensions).await
    }
}
