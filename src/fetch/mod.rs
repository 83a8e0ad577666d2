//! Retrieval of raw GTFS-RT payloads from a URL or a local file.

mod auth;
mod basic;
mod client;

pub use auth::{Authenticated, FeedAuth};
pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::debug;

use crate::error::FetchError;

/// Fetches `url` and returns the response body.
///
/// # Errors
///
/// Fails on transport errors and on any non-success HTTP status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = url.parse().map_err(|_| FetchError::Url(url.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            url: url.to_string(),
        });
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(bytes = bytes.len(), "Feed bytes received");
    Ok(bytes)
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(client))]
pub async fn load_feed_bytes<C: HttpClient>(
    client: &C,
    source: &str,
) -> Result<Vec<u8>, FetchError> {
    if source.starts_with("http") {
        fetch_bytes(client, source).await
    } else {
        tokio::fs::read(source)
            .await
            .map_err(|source_err| FetchError::File {
                path: source.to_string(),
                source: source_err,
            })
    }
}
