use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// An [`HttpClient`] wrapper that appends a fixed query parameter to every
/// request.
///
/// The upstream data API answers XML unless asked otherwise, so the client
/// stack is built with [`UrlParam::json_format`]. A parameter already present
/// on the URL is left alone.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub value: String,
}

impl<C> UrlParam<C> {
    /// `$format=JSON` on every request.
    pub fn json_format(inner: C) -> Self {
        Self {
            inner,
            param_name: "$format".to_string(),
            value: "JSON".to_string(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let present = req.url().query_pairs().any(|(k, _)| k == self.param_name);
        if !present {
            req.url_mut()
                .query_pairs_mut()
                .append_pair(&self.param_name, &self.value);
        }
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpClient for Recorder {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.urls.lock().unwrap().push(req.url().to_string());
            Ok(http::Response::builder().status(200).body("[]").unwrap().into())
        }
    }

    fn get(url: &str) -> reqwest::Request {
        reqwest::Request::new(reqwest::Method::GET, url.parse().unwrap())
    }

    #[tokio::test]
    async fn test_appends_format_param() {
        let client = UrlParam::json_format(Recorder::default());
        client.execute(get("https://example.test/v2/Bike/Station/City/Taipei")).await.unwrap();

        let urls = client.inner.urls.lock().unwrap();
        assert_eq!(
            urls[0],
            "https://example.test/v2/Bike/Station/City/Taipei?%24format=JSON"
        );
    }

    #[tokio::test]
    async fn test_existing_param_is_not_duplicated() {
        let client = UrlParam::json_format(Recorder::default());
        client.execute(get("https://example.test/x?$format=JSON")).await.unwrap();

        let urls = client.inner.urls.lock().unwrap();
        assert_eq!(urls[0].matches("format").count(), 1);
    }
}
