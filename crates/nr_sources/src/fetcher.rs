use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use nr_core::{ArticleFetcher, Result, Settings};
use crate::extract::extract_article_text;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Downloads article pages and pulls readable text out of the HTML.
#[derive(Debug, Clone)]
pub struct HtmlArticleFetcher {
    client: Client,
    max_chars: usize,
}

impl HtmlArticleFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, max_chars })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.request_timeout(), settings.max_article_length)
    }

    async fn download(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }
}

#[async_trait]
impl ArticleFetcher for HtmlArticleFetcher {
    async fn fetch_full_text(&self, url: &str) -> Option<String> {
        match self.download(url).await {
            Ok(html) => {
                let text = extract_article_text(&html, self.max_chars);
                if text.is_none() {
                    tracing::debug!("No readable text found at {}", url);
                }
                text
            }
            Err(e) => {
                tracing::warn!("Error extracting content from {}: {}", url, e);
                None
            }
        }
    }
}
