//! Environment-driven settings.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::fetch::HttpClient;
use crate::fetch::auth::{
    BackendTokenSource, ClientCredentialsSource, DEFAULT_AUTH_URL, DEFAULT_SAFETY_MARGIN_SECS,
    TokenSource,
};
use crate::infra::tdx::endpoints::DEFAULT_BASE_URL;

/// Long-lived client credentials for the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Where bearer tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenConfig {
    /// A trusted backend answering `POST` with a token.
    Backend { url: String },
    /// This process performs the exchange itself.
    Direct(ClientCredentials),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub token: TokenConfig,
    /// Present whenever `CLIENT_ID` and `CLIENT_SECRET` are set, even if a
    /// backend is used for the client side. The token server needs these.
    pub credentials: Option<ClientCredentials>,
    pub token_safety_margin: chrono::Duration,
    pub bike_refresh: Duration,
    pub bus_countdown_secs: u64,
    pub error_display: Duration,
    pub http_timeout: Duration,
}

impl Settings {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: u64| -> Result<u64> {
            match var(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}")),
                None => Ok(default),
            }
        };

        let credentials = match (var("CLIENT_ID"), var("CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                auth_url: var("TDX_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let token = match (var("TOKEN_ENDPOINT"), &credentials) {
            (Some(url), _) => TokenConfig::Backend { url },
            (None, Some(creds)) => TokenConfig::Direct(creds.clone()),
            (None, None) => {
                bail!("set TOKEN_ENDPOINT, or CLIENT_ID and CLIENT_SECRET, to obtain access tokens")
            }
        };

        let margin = secs("TOKEN_SAFETY_MARGIN_SECS", DEFAULT_SAFETY_MARGIN_SECS as u64)?;

        Ok(Self {
            base_url: var("TDX_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token,
            credentials,
            token_safety_margin: chrono::Duration::seconds(i64::try_from(margin)?),
            bike_refresh: Duration::from_secs(secs("BIKE_REFRESH_SECS", 300)?),
            bus_countdown_secs: secs("BUS_COUNTDOWN_SECS", 30)?,
            error_display: Duration::from_secs(secs("ERROR_DISPLAY_SECS", 3)?),
            http_timeout: Duration::from_secs(secs("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    /// Token source for the data client.
    pub fn token_source<C: HttpClient + 'static>(&self, client: C) -> Arc<dyn TokenSource> {
        match &self.token {
            TokenConfig::Backend { url } => Arc::new(BackendTokenSource::new(client, url.clone())),
            TokenConfig::Direct(creds) => Arc::new(creds.source(client)),
        }
    }
}

impl ClientCredentials {
    pub fn source<C>(&self, client: C) -> ClientCredentialsSource<C> {
        ClientCredentialsSource::new(
            client,
            self.auth_url.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        )
    }
}
