//! Bounded page fetching.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::USER_AGENT;

use crate::config::{DEFAULT_USER_AGENT, MAX_RESPONSE_BODY_SIZE};

/// A successfully fetched (2xx) page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,
    /// HTTP status
    pub status: u16,
    /// Body, lossily decoded and capped at the fetcher's size limit
    pub body: String,
}

/// GETs pages with a body-size cap.
#[derive(Clone)]
pub struct PageFetcher {
    client: Arc<reqwest::Client>,
    max_body: usize,
}

impl PageFetcher {
    /// Creates a fetcher capped at [`MAX_RESPONSE_BODY_SIZE`].
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self {
            client,
            max_body: MAX_RESPONSE_BODY_SIZE,
        }
    }

    /// Overrides the body-size cap.
    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &Arc<reqwest::Client> {
        &self.client
    }

    /// Fetches a page with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.fetch_as(url, DEFAULT_USER_AGENT).await
    }

    /// Fetches a page with an explicit user agent.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn fetch_as(&self, url: &str, user_agent: &str) -> Result<FetchedPage> {
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {} returned HTTP {}", url, status.as_u16());
        }
        let final_url = response.url().to_string();

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("reading body of {} failed", url))?
        {
            body.extend_from_slice(&chunk);
            if body.len() >= self.max_body {
                log::debug!("Truncating body of {} at {} bytes", url, self.max_body);
                body.truncate(self.max_body);
                break;
            }
        }

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
