//! Text retrieval for resolved sources.
//!
//! Inline text is returned as-is, files are read from disk, and remote
//! documents are fetched over HTTP. Failures propagate unchanged; nothing is
//! retried or cached.

use std::time::Duration;

use autocat_shared::{CatError, HttpConfig, ResolvedSource, Result};
use reqwest::Client;
use tracing::{debug, instrument};

/// Maximum number of redirects to follow for remote sources.
const MAX_REDIRECTS: usize = 5;

/// Reads the text behind a [`ResolvedSource`].
#[derive(Debug, Clone)]
pub struct SourceReader {
    client: Client,
}

impl SourceReader {
    /// Build a reader with its own HTTP client.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(http.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        if http.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(http.timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| CatError::network("<client>", e))?;
        Ok(Self { client })
    }

    /// Retrieve the full text of `source`.
    #[instrument(skip_all, fields(kind = source.kind(), label = source.label()))]
    pub async fn read(&self, source: &ResolvedSource) -> Result<String> {
        match source {
            ResolvedSource::Inline { original, .. } => Ok(original.clone()),
            ResolvedSource::File { original, .. } => {
                let text = tokio::fs::read_to_string(original)
                    .await
                    .map_err(|e| CatError::io(original, e))?;
                debug!(bytes = text.len(), "read file");
                Ok(text)
            }
            ResolvedSource::Remote { original, .. } => self.fetch(original).await,
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatError::network(url, e))?;
        debug!(bytes = body.len(), "fetched remote source");
        Ok(body)
    }
}
