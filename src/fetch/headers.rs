use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderMap;

/// An [`HttpClient`] wrapper that adds fixed headers (an API key, say) to
/// every request, replacing any value already set under the same name.
pub struct ExtraHeaders<C> {
    pub inner: C,
    pub headers: HeaderMap,
}

impl<C> ExtraHeaders<C> {
    pub fn new(inner: C, headers: HeaderMap) -> Self {
        Self { inner, headers }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ExtraHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        for (name, value) in &self.headers {
            req.headers_mut().insert(name.clone(), value.clone());
        }
        self.inner.execute(req).await
    }
}
