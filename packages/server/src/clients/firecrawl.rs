//! Firecrawl-backed structured extraction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use analysis::{AnalysisError, StructuredData, StructuredExtractor};

const EXTRACT_PROMPT: &str = "Extract the business name, a one-sentence summary of the products \
     sold, the shipping policy text as stated on the site, and the free-shipping threshold \
     amount if one exists.";

/// Firecrawl extract-API client implementing [`StructuredExtractor`].
pub struct FirecrawlExtractor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    urls: Vec<&'a str>,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<StructuredData>,
}

impl FirecrawlExtractor {
    /// Create a new extractor client.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.firecrawl.dev".to_string(),
        })
    }

    /// Set a custom base URL (for tests/proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn error(url: &str, reason: impl Into<String>) -> AnalysisError {
        AnalysisError::Extraction {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl StructuredExtractor for FirecrawlExtractor {
    async fn extract(&self, url: &str) -> analysis::Result<StructuredData> {
        let request = ExtractRequest {
            urls: vec![url],
            prompt: EXTRACT_PROMPT,
        };

        let response = self
            .client
            .post(format!("{}/v1/extract", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::error(url, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error(url, format!("HTTP {}: {}", status, body)));
        }

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| Self::error(url, format!("unparseable response: {}", e)))?;

        if !parsed.success {
            return Err(Self::error(url, "extraction reported failure"));
        }

        parsed
            .data
            .ok_or_else(|| Self::error(url, "extraction returned no data"))
    }
}
