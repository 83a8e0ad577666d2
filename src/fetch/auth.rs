use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

use super::client::HttpClient;
use crate::error::FetchError;

/// How a feed expects its API key to be presented.
#[derive(Debug, Clone)]
pub enum FeedAuth {
    /// Sent as an HTTP header, e.g. `x-api-key: <key>`.
    Header { name: HeaderName, value: HeaderValue },
    /// Appended to the URL, e.g. `?api_key=<key>`.
    QueryParam { name: String, value: String },
}

impl FeedAuth {
    pub fn header(name: &str, key: &str) -> Result<Self, FetchError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FetchError::Header(name.to_string()))?;
        let mut value =
            HeaderValue::from_str(key).map_err(|_| FetchError::Header(name.to_string()))?;
        value.set_sensitive(true);
        Ok(FeedAuth::Header { name, value })
    }

    pub fn query_param(name: &str, key: &str) -> Self {
        FeedAuth::QueryParam {
            name: name.to_string(),
            value: key.to_string(),
        }
    }

    fn apply(&self, req: &mut reqwest::Request) {
        match self {
            FeedAuth::Header { name, value } => {
                req.headers_mut().insert(name.clone(), value.clone());
            }
            FeedAuth::QueryParam { name, value } => {
                req.url_mut().query_pairs_mut().append_pair(name, value);
            }
        }
    }
}

/// An [`HttpClient`] wrapper that attaches a [`FeedAuth`] to every request.
pub struct Authenticated<C> {
    pub inner: C,
    pub auth: FeedAuth,
}

#[async_trait]
impl<C: HttpClient> HttpClient for Authenticated<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.auth.apply(&mut req);
        self.inner.execute(req).await
    }
}
