use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::domain::ComicId;
use crate::error::ArchiveError;

/// Metadata fields extracted from the per-comic JSON endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ComicInfo {
    pub title: String,
    pub img: String,
}

pub trait ComicClient: Send + Sync {
    fn fetch_comic(&self, id: ComicId) -> Result<ComicInfo, ArchiveError>;
}

#[derive(Clone)]
pub struct ComicHttpClient {
    client: Client,
    base_url: String,
}

impl ComicHttpClient {
    pub fn new(base_url: &str) -> Result<Self, ArchiveError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("comic-archiver/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ArchiveError::Http(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ArchiveError::Http(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn info_url(&self, id: ComicId) -> String {
        format!("{}/{}/info.0.json", self.base_url, id)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ArchiveError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "comic request failed".to_string());
        Err(ArchiveError::Status { status, message })
    }
}

impl ComicClient for ComicHttpClient {
    /// One attempt per id. A non-success status is reported as
    /// `ArchiveError::Status` for the caller to skip; no retries.
    fn fetch_comic(&self, id: ComicId) -> Result<ComicInfo, ArchiveError> {
        let url = self.info_url(id);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| ArchiveError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| ArchiveError::Http(err.to_string()))
    }
}
