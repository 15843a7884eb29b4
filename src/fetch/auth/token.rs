//! Token sources: where a fresh bearer token comes from.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransitError};
use crate::fetch::client::HttpClient;

/// Default OIDC token URL of the upstream identity provider.
pub const DEFAULT_AUTH_URL: &str =
    "https://tdx.transportdata.tw/auth/realms/TDXConnect/protocol/openid-connect/token";

/// Token payload as returned by both the identity provider and the local
/// backend. `expires_in` is the declared lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
}

/// Performs one token exchange.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn exchange(&self) -> Result<TokenGrant>;
}

/// Asks the trusted backend for a token with an empty `POST`. The client
/// never sees the long-lived credentials.
pub struct BackendTokenSource<C> {
    client: C,
    url: String,
}

impl<C> BackendTokenSource<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> TokenSource for BackendTokenSource<C> {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn exchange(&self) -> Result<TokenGrant> {
        let url = self
            .url
            .parse()
            .map_err(|e| TransitError::Auth(format!("invalid token endpoint: {e}")))?;
        send_exchange(&self.client, Request::new(Method::POST, url)).await
    }
}

/// The `client_credentials` grant against the identity provider. Only the
/// trusted backend (the token server, or a CLI acting as its own backend)
/// holds one of these.
pub struct ClientCredentialsSource<C> {
    client: C,
    auth_url: String,
    client_id: String,
    client_secret: String,
}

impl<C> ClientCredentialsSource<C> {
    pub fn new(
        client: C,
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn form_body(&self) -> String {
        format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret)
        )
    }
}

#[async_trait]
impl<C: HttpClient> TokenSource for ClientCredentialsSource<C> {
    #[tracing::instrument(skip(self), fields(auth_url = %self.auth_url))]
    async fn exchange(&self) -> Result<TokenGrant> {
        let url = self
            .auth_url
            .parse()
            .map_err(|e| TransitError::Auth(format!("invalid auth url: {e}")))?;
        let mut req = Request::new(Method::POST, url);
        req.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        *req.body_mut() = Some(self.form_body().into());
        send_exchange(&self.client, req).await
    }
}

async fn send_exchange<C: HttpClient>(client: &C, req: Request) -> Result<TokenGrant> {
    let response = client
        .execute(req)
        .await
        .map_err(|e| TransitError::Auth(format!("failed to send token request: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(TransitError::Auth(format!(
            "token exchange failed with status {status}: {body}"
        )));
    }

    response
        .json::<TokenGrant>()
        .await
        .map_err(|e| TransitError::Auth(format!("failed to parse token response: {e}")))
}
