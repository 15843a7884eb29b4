use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::header::HeaderValue;
use tracing::{debug, info, warn};

use super::token::{TokenGrant, TokenSource};
use crate::error::{Result, TransitError};

/// Seconds shaved off the declared token lifetime.
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

/// A bearer token and the instant after which it must not be used.
///
/// Never mutated; renewal swaps in a new `Arc<Credential>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// `expires_at = issued_at + expires_in - margin`.
    pub fn from_grant(grant: &TokenGrant, issued_at: DateTime<Utc>, margin: Duration) -> Self {
        Self {
            token: grant.access_token.clone(),
            expires_at: issued_at + Duration::seconds(grant.expires_in) - margin,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn header_value(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| TransitError::Auth(format!("token is not a valid header value: {e}")))
    }
}

type Renewal = Shared<BoxFuture<'static, Result<Arc<Credential>>>>;

#[derive(Default)]
struct Slot {
    current: Option<Arc<Credential>>,
    pending: Option<Renewal>,
}

/// Process-wide bearer token holder.
///
/// Callers that arrive while a renewal is in flight await the same shared
/// future, so concurrent misses cost one exchange and observe one outcome.
/// A failed renewal is not cached; the next call tries again.
pub struct CredentialProvider {
    source: Arc<dyn TokenSource>,
    margin: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl CredentialProvider {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_margin(source, Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS))
    }

    pub fn with_margin(source: Arc<dyn TokenSource>, margin: Duration) -> Self {
        Self {
            source,
            margin,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Returns a valid credential, renewing it if needed.
    pub async fn credential(&self) -> Result<Arc<Credential>> {
        let renewal = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(current) = &slot.current {
                if current.is_valid_at(Utc::now()) {
                    return Ok(current.clone());
                }
            }
            match &slot.pending {
                Some(pending) => {
                    debug!("Joining in-flight token renewal");
                    pending.clone()
                }
                None => {
                    let renewal = renew(self.source.clone(), self.margin, self.slot.clone())
                        .boxed()
                        .shared();
                    slot.pending = Some(renewal.clone());
                    renewal
                }
            }
        };
        renewal.await
    }

    /// `Authorization` header value for the current credential.
    pub async fn auth_header(&self) -> Result<HeaderValue> {
        self.credential().await?.header_value()
    }
}

async fn renew(
    source: Arc<dyn TokenSource>,
    margin: Duration,
    slot: Arc<Mutex<Slot>>,
) -> Result<Arc<Credential>> {
    let issued_at = Utc::now();
    let outcome = source
        .exchange()
        .await
        .map(|grant| Arc::new(Credential::from_grant(&grant, issued_at, margin)));

    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    slot.pending = None;
    match &outcome {
        Ok(credential) => {
            info!(expires_at = %credential.expires_at, "Bearer token renewed");
            slot.current = Some(credential.clone());
        }
        Err(e) => warn!(error = %e, "Token renewal failed"),
    }
    outcome
}
