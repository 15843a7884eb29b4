//! Error taxonomy shared by every layer between the HTTP client and the views.

use thiserror::Error;

/// Failure of a single upstream resource.
///
/// Errors are plain values: the fetcher never panics past its boundary and
/// sessions keep one `Option<TransitError>` slot per resource, so the type is
/// `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitError {
    /// The token exchange failed or returned an unusable payload.
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// Upstream answered HTTP 429.
    #[error("Rate limited by upstream")]
    RateLimited,
    /// Network failure, non-2xx status or an unparsable body.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// The response was valid but carried nothing usable.
    #[error("No data: {0}")]
    NoData(String),
}

impl TransitError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            TransitError::Auth(_) => "auth-failed",
            TransitError::RateLimited => "rate-limited",
            TransitError::FetchFailed(_) => "fetch-failed",
            TransitError::NoData(_) => "no-data",
        }
    }

    /// Localized message suitable for inline display.
    pub fn user_message(&self) -> &'static str {
        match self {
            TransitError::Auth(_) => "系統認證發生問題，請稍後再試",
            TransitError::RateLimited => "請求過於頻繁，請稍後再試",
            TransitError::FetchFailed(_) => "資料取得失敗，請稍後再試",
            TransitError::NoData(_) => "查無資料",
        }
    }
}

impl From<reqwest::Error> for TransitError {
    fn from(err: reqwest::Error) -> Self {
        TransitError::FetchFailed(err.to_string())
    }
}

impl From<serde_json::Error> for TransitError {
    fn from(err: serde_json::Error) -> Self {
        TransitError::FetchFailed(format!("invalid JSON: {err}"))
    }
}

pub type Result<T, E = TransitError> = std::result::Result<T, E>;
