use async_trait::async_trait;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

/// Refresh this long before the reported expiry to avoid using a token that
/// dies mid-request.
const EXPIRY_MARGIN: Duration = Duration::seconds(30);

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Capability for supplying a bearer credential to the API client.
///
/// Injected into [`crate::MeteringClient`]; the client itself holds no
/// authentication state.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String, AuthError>;
}

/// Fixed token, for tests and pre-provisioned local setups.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Option<OffsetDateTime>,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        match self.expires_at {
            Some(expires_at) => now + EXPIRY_MARGIN < expires_at,
            // No expiry reported; use it until the server says otherwise.
            None => true,
        }
    }
}

/// OAuth2 client-credentials token source.
///
/// Performs a form POST against the configured token endpoint and caches the
/// returned token until shortly before its reported expiry.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl ClientCredentials {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken, AuthError> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = token
            .expires_in
            .map(|secs| OffsetDateTime::now_utc() + Duration::seconds(secs));

        tracing::debug!(expires_in = ?token.expires_in, "acquired bearer token");

        Ok(CachedToken {
            token: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        let mut guard = self.cached.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh(OffsetDateTime::now_utc()) {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }
}
