//! Bearer-token acquisition.
//!
//! [`TokenSource`] performs one exchange: [`BackendTokenSource`] asks the
//! trusted backend, [`ClientCredentialsSource`] is what the backend itself
//! does. [`CredentialProvider`] caches the result and collapses concurrent
//! renewals. [`UrlParam`] is unrelated to tokens but shares the
//! request-decorating shape.

mod credential;
mod token;
mod url_param;

pub use credential::{Credential, CredentialProvider, DEFAULT_SAFETY_MARGIN_SECS};
pub use token::{
    BackendTokenSource, ClientCredentialsSource, DEFAULT_AUTH_URL, TokenGrant, TokenSource,
};
pub use url_param::UrlParam;
