// src/source/client.rs
use reqwest::header;

use crate::utils::error::SourceError;

const USER_AGENT: &str = concat!("grade_extractor/", env!("CARGO_PKG_VERSION"));

/// Creates a reqwest client configured for fetching report pages.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
}

/// Downloads a page and returns its body as text.
pub async fn download_page(url: &str) -> Result<String, SourceError> {
    let client = build_client()?;

    tracing::info!("Downloading document from: {}", url);
    tracing::debug!("Using User-Agent: {}", USER_AGENT);

    let response = client
        .get(url)
        .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
        .send()
        .await?; // Propagates reqwest::Error as SourceError::Network

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        return Err(SourceError::Http(status));
    }

    let body = response.text().await?;
    tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}
