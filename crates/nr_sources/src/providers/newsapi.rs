use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;
use nr_core::{ArticleMetadata, NewsSource, Result, Settings};

#[derive(Deserialize)]
struct NewsApiResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Option<Vec<NewsApiArticle>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSourceRef>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize)]
struct NewsApiSourceRef {
    name: Option<String>,
}

impl From<NewsApiArticle> for ArticleMetadata {
    fn from(article: NewsApiArticle) -> Self {
        ArticleMetadata {
            title: article.title.unwrap_or_default(),
            url: article.url.unwrap_or_default(),
            author: article.author,
            description: article.description,
            published_at: article
                .published_at
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            content: article.content,
            source_name: article.source.and_then(|s| s.name).unwrap_or_default(),
        }
    }
}

/// Client for the NewsAPI `everything` endpoint.
pub struct NewsApiSource {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for NewsApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiSource")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NewsApiSource {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.news_api_key.clone(),
            settings.news_api_url.clone(),
            settings.request_timeout(),
        )
    }

    fn search_url(&self, query: &str, page_size: usize) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/everything", self.base_url),
            &[
                ("q", query.to_string()),
                ("pageSize", page_size.to_string()),
                ("language", "en".to_string()),
            ],
        )
        .map_err(|e| nr_core::Error::InvalidConfig(format!("Invalid NewsAPI url: {}", e)))
    }

    async fn search(&self, query: &str, page_size: usize) -> Result<Vec<ArticleMetadata>> {
        let url = self.search_url(query, page_size)?;
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?.json::<NewsApiResponse>().await?;
        if response.status != "ok" {
            return Err(nr_core::Error::Transport(format!(
                "NewsAPI error: {}",
                response.message.unwrap_or_else(|| "Unknown error".to_string())
            )));
        }

        Ok(response
            .articles
            .unwrap_or_default()
            .into_iter()
            .map(ArticleMetadata::from)
            .collect())
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn fetch_articles(&self, query: &str, page_size: usize) -> Result<Vec<ArticleMetadata>> {
        if self.api_key.is_none() {
            tracing::error!("NewsAPI key is not configured, returning no articles");
            return Ok(Vec::new());
        }

        match self.search(query, page_size).await {
            Ok(articles) => {
                tracing::debug!("📰 NewsAPI returned {} articles for '{}'", articles.len(), query);
                Ok(articles)
            }
            Err(e) => {
                tracing::error!("Error fetching news for query '{}': {}", query, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_article_conversion() {
        let raw = r#"{
            "source": {"id": null, "name": "The Wire"},
            "author": "Jo",
            "title": "AI models get cheaper",
            "description": "Prices fall again.",
            "url": "https://example.com/ai",
            "publishedAt": "2024-05-01T10:00:00Z",
            "content": "Prices fall again... [+1200 chars]"
        }"#;
        let article: NewsApiArticle = serde_json::from_str(raw).unwrap();
        let meta = ArticleMetadata::from(article);
        assert_eq!(meta.source_name, "The Wire");
        assert_eq!(meta.title, "AI models get cheaper");
        assert!(meta.published_at.is_some());
    }

    #[test]
    fn test_bad_date_is_ignored() {
        let raw = r#"{"title": "t", "url": "u", "publishedAt": "yesterday"}"#;
        let article: NewsApiArticle = serde_json::from_str(raw).unwrap();
        assert!(ArticleMetadata::from(article).published_at.is_none());
    }

    #[tokio::test]
    async fn test_fetch_articles_against_local_server() {
        let app = Router::new().route(
            "/everything",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("q").map(String::as_str), Some("artificial intelligence"));
                assert_eq!(params.get("pageSize").map(String::as_str), Some("3"));
                Json(serde_json::json!({
                    "status": "ok",
                    "totalResults": 1,
                    "articles": [{
                        "source": {"name": "Wire"},
                        "title": "AI news",
                        "url": "https://example.com/a",
                        "description": "desc"
                    }]
                }))
            }),
        );
        let base = serve(app).await;
        let source = NewsApiSource::new(Some("key".to_string()), base, Duration::from_secs(5)).unwrap();

        let articles = source.fetch_articles("artificial intelligence", 3).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "AI news");
    }

    #[tokio::test]
    async fn test_provider_error_becomes_empty_list() {
        let app = Router::new().route(
            "/everything",
            get(|| async {
                Json(serde_json::json!({"status": "error", "code": "apiKeyInvalid", "message": "bad key"}))
            }),
        );
        let base = serve(app).await;
        let source = NewsApiSource::new(Some("key".to_string()), base, Duration::from_secs(5)).unwrap();

        let articles = source.fetch_articles("anything", 3).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_returns_nothing() {
        let source = NewsApiSource::new(None, "http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        assert!(source.fetch_articles("q", 3).await.unwrap().is_empty());
    }
}
