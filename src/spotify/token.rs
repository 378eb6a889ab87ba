use std::fmt;
use std::sync::Arc;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::error::SearchError;

/// Exchanges client credentials for a bearer token.
#[derive(Clone)]
pub struct TokenProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TokenProvider {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Performs a single credential exchange. No retry.
    pub async fn acquire(&self) -> Result<String, SearchError> {
        let params = [
            ("grant_type", "client_credentials"),
        ];
        let auth = base64::engine::general_purpose::STANDARD.encode(
            format!("{}:{}", self.client_id, self.client_secret).as_bytes(),
        );

        let res = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|e| SearchError::Upstream(format!("token request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SearchError::Upstream(format!(
                "token request failed: {} - {}",
                status, body
            )));
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| SearchError::Upstream(format!("token parse failed: {}", e)))?;

        if body.access_token.is_empty() {
            return Err(SearchError::Upstream("token response carried an empty access_token".into()));
        }
        Ok(body.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Bearer credential shared by every catalog call for the process lifetime.
///
/// Acquired once and never refreshed. An empty credential makes every call
/// fail with [`SearchError::Unauthenticated`] before any request is built.
#[derive(Clone, Default)]
pub struct Credential {
    token: Option<Arc<str>>,
}

impl Credential {
    /// Runs the credential exchange once. Failure is logged and yields an
    /// empty credential rather than an error.
    pub async fn acquire(provider: &TokenProvider) -> Self {
        match provider.acquire().await {
            Ok(token) => {
                tracing::info!("acquired Spotify access token");
                Self::from_token(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not acquire Spotify access token; searches will be rejected");
                Self::missing()
            }
        }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        let token: String = token.into();
        if token.is_empty() {
            return Self::missing();
        }
        Self {
            token: Some(Arc::from(token)),
        }
    }

    pub fn missing() -> Self {
        Self { token: None }
    }

    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }

    pub fn bearer(&self) -> Result<&str, SearchError> {
        self.token.as_deref().ok_or(SearchError::Unauthenticated)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("present", &self.is_present())
            .finish()
    }
}
