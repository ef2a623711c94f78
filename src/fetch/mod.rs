mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Issues a single GET and returns the body. Non-2xx responses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid url '{url}'"))?,
    );

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()?;
    let bytes = resp.bytes().await?.to_vec();

    debug!(bytes = bytes.len(), "Response body received");
    Ok(bytes)
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        fetch_bytes(client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read '{source}'"))?
    };
    info!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}
