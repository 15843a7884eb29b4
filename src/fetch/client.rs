use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam under every upstream call.
///
/// Wrappers such as [`UrlParam`](super::UrlParam) decorate an inner client;
/// tests substitute canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
