//! Client for the nuclei-templates tag catalog.
//!
//! The catalog is the `TEMPLATES-STATS.json` file published with the
//! nuclei-templates repository. Only `tags[].name` is read; everything else
//! in the document is ignored. Nothing is cached.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::config::CatalogConfig;

/// Shape of the catalog document, reduced to the fields we read.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResponse {
    pub tags: Vec<CatalogTag>,
}

/// One tag entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTag {
    pub name: String,
}

/// Errors from fetching or parsing the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Failed to fetch tags: {0}")]
    Status(StatusCode),

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fetches tag names from the remote catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    url: Url,
}

impl CatalogClient {
    /// Build a client for the configured catalog URL.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let url =
            Url::parse(&config.url).map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("nuclei-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self { client, url })
    }

    /// Build a client for `url` with the default timeout.
    pub fn with_url(url: impl Into<String>) -> Result<Self, CatalogError> {
        Self::new(&CatalogConfig {
            url: url.into(),
            timeout: Duration::from_secs(30),
        })
    }

    /// The resource this client reads.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the catalog and return tag names in document order.
    pub async fn fetch_tag_names(&self) -> Result<Vec<String>, CatalogError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(CatalogError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let body = response.bytes().await.map_err(CatalogError::Request)?;
        let catalog: CatalogResponse = serde_json::from_slice(&body)?;

        tracing::debug!(url = %self.url, tags = catalog.tags.len(), "fetched tag catalog");

        Ok(catalog.tags.into_iter().map(|tag| tag.name).collect())
    }
}
