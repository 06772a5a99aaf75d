use async_trait::async_trait;
use crate::types::{ArticleMetadata, Team};
use crate::Result;

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Returns the name of the news provider
    fn name(&self) -> &str;

    /// Search for up to `page_size` articles matching `query`.
    ///
    /// Provider-side failures are reduced to an empty list; an `Err` is
    /// reserved for failures the caller must see (e.g. a broken transport).
    async fn fetch_articles(&self, query: &str, page_size: usize) -> Result<Vec<ArticleMetadata>>;
}

#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Download and extract the readable text behind `url`. `None` on any failure.
    async fn fetch_full_text(&self, url: &str) -> Option<String>;
}

#[async_trait]
pub trait TeamSource: Send + Sync {
    async fn fetch_teams(&self, league: &str) -> Vec<Team>;
}
