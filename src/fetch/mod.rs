mod basic;
mod client;
pub mod auth;

pub use auth::UrlParam;
pub use basic::BasicClient;
pub use client::HttpClient;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Result, TransitError};
use auth::CredentialProvider;

/// Authenticated JSON GETs against the upstream data API.
///
/// Every failure comes back as a [`TransitError`] value: 429 is
/// [`TransitError::RateLimited`], any other non-2xx, transport or decode
/// failure is [`TransitError::FetchFailed`], and a failed token exchange is
/// [`TransitError::Auth`]. Sibling requests joined together therefore never
/// cancel each other.
pub struct Fetcher<C> {
    client: C,
    credentials: Arc<CredentialProvider>,
    base_url: String,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, credentials: Arc<CredentialProvider>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    #[tracing::instrument(skip_all, fields(path = %path))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url_for(path);
        let auth = self.credentials.auth_header().await?;

        let mut req = reqwest::Request::new(
            reqwest::Method::GET,
            url.parse()
                .map_err(|e| TransitError::FetchFailed(format!("invalid url {url}: {e}")))?,
        );
        req.headers_mut().insert(AUTHORIZATION, auth);

        debug!(url = %url, "Requesting");
        let resp = self.client.execute(req).await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Upstream rate limit hit");
            return Err(TransitError::RateLimited);
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(TransitError::FetchFailed(format!("HTTP {status}")));
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
