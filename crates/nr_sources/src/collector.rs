use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use nr_core::timeout::with_timeout;
use nr_core::{Article, ArticleFetcher, NewsSource, Result, Settings};

/// Turns a search query into articles with text: metadata from the news
/// provider, then the full page text for each hit, pausing between fetches.
#[derive(Clone)]
pub struct ArticleCollector {
    news: Arc<dyn NewsSource>,
    fetcher: Arc<dyn ArticleFetcher>,
    fetch_delay: Duration,
    timeout: Duration,
}

impl ArticleCollector {
    pub fn new(news: Arc<dyn NewsSource>, fetcher: Arc<dyn ArticleFetcher>, settings: &Settings) -> Self {
        Self {
            news,
            fetcher,
            fetch_delay: settings.fetch_delay(),
            timeout: settings.request_timeout(),
        }
    }

    /// Collects up to `page_size` articles for `query`.
    ///
    /// Articles that end up with no text at all are dropped. A failing or
    /// slow news search is returned as an error; a failing page fetch only
    /// loses that page's full text.
    pub async fn collect(&self, query: &str, page_size: usize) -> Result<Vec<Article>> {
        let metadata = with_timeout(
            self.timeout,
            "news search",
            self.news.fetch_articles(query, page_size),
        )
        .await?;

        tracing::info!("🔎 {} returned {} results for '{}'", self.news.name(), metadata.len(), query);

        let mut articles = Vec::with_capacity(metadata.len());
        for (idx, meta) in metadata.into_iter().take(page_size).enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.fetch_delay).await;
            }

            let full_text = if meta.url.trim().is_empty() {
                None
            } else {
                self.fetch_text(&meta.url).await
            };

            let title = meta.title.clone();
            match meta.into_article(full_text) {
                Some(article) => articles.push(article),
                None => tracing::warn!("Dropping article without any text: '{}'", title),
            }
        }

        Ok(articles)
    }

    /// Collects every query in turn and removes articles already seen under
    /// an earlier query (same url).
    pub async fn collect_all(&self, queries: &[String], page_size: usize) -> Result<Vec<Article>> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        for query in queries {
            for article in self.collect(query, page_size).await? {
                if article.has_url() && !seen.insert(article.url.clone()) {
                    continue;
                }
                all.push(article);
            }
        }

        Ok(all)
    }

    async fn fetch_text(&self, url: &str) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch_full_text(url)).await {
            Ok(text) => text,
            Err(_) => {
                tracing::warn!("Fetching {} did not finish within {:?}", url, self.timeout);
                None
            }
        }
    }
}
