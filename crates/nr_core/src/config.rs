use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use crate::{Error, Result};

/// Runtime settings, read from the environment and overridable from the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub news_api_key: Option<String>,
    pub news_api_url: String,
    pub sports_db_url: String,

    pub default_model: String,
    pub embedding_model: String,
    /// Vector size of `embedding_model`; known OpenAI models need no value here.
    pub embedding_dimensions: Option<usize>,
    pub default_temperature: f32,
    pub max_tokens: u32,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k_results: usize,
    pub max_fragment_chars: usize,

    pub default_news_page_size: usize,
    pub agent_page_size: usize,
    pub max_article_length: usize,
    pub fetch_delay_ms: u64,
    pub request_timeout_secs: u64,

    pub graph_news_limit: usize,
    pub graph_preview_chars: usize,
    pub keywords_per_article: usize,

    pub log_level: String,
    pub api_host: String,
    pub api_port: u16,

    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub sqlite_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            news_api_key: None,
            news_api_url: "https://newsapi.org/v2".to_string(),
            sports_db_url: "https://www.thesportsdb.com/api/v1/json/3".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: None,
            default_temperature: 0.1,
            max_tokens: 2000,
            chunk_size: 500,
            chunk_overlap: 50,
            top_k_results: 3,
            max_fragment_chars: 1000,
            default_news_page_size: 5,
            agent_page_size: 3,
            max_article_length: 3000,
            fetch_delay_ms: 1000,
            request_timeout_secs: 30,
            graph_news_limit: 5,
            graph_preview_chars: 300,
            keywords_per_article: 5,
            log_level: "info".to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_collection: "news_chunks".to_string(),
            sqlite_path: "newsrag.db".to_string(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str, target: &mut T) -> Result<()> {
    if let Some(raw) = env_string(name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("{} has an invalid value: {}", name, raw)))?;
    }
    Ok(())
}

impl Settings {
    /// Defaults overlaid with whatever is set in the environment.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        settings.openai_api_key = env_string("OPENAI_API_KEY");
        settings.news_api_key = env_string("NEWS_API_KEY");
        env_parse("OPENAI_BASE_URL", &mut settings.openai_base_url)?;
        env_parse("NEWS_API_URL", &mut settings.news_api_url)?;
        env_parse("SPORTS_DB_URL", &mut settings.sports_db_url)?;
        env_parse("DEFAULT_MODEL", &mut settings.default_model)?;
        env_parse("EMBEDDING_MODEL", &mut settings.embedding_model)?;
        if env_string("EMBEDDING_DIMENSIONS").is_some() {
            let mut dimensions = 0usize;
            env_parse("EMBEDDING_DIMENSIONS", &mut dimensions)?;
            settings.embedding_dimensions = Some(dimensions);
        }
        env_parse("DEFAULT_TEMPERATURE", &mut settings.default_temperature)?;
        env_parse("MAX_TOKENS", &mut settings.max_tokens)?;
        env_parse("CHUNK_SIZE", &mut settings.chunk_size)?;
        env_parse("CHUNK_OVERLAP", &mut settings.chunk_overlap)?;
        env_parse("TOP_K_RESULTS", &mut settings.top_k_results)?;
        env_parse("MAX_FRAGMENT_CHARS", &mut settings.max_fragment_chars)?;
        env_parse("DEFAULT_NEWS_PAGE_SIZE", &mut settings.default_news_page_size)?;
        env_parse("AGENT_PAGE_SIZE", &mut settings.agent_page_size)?;
        env_parse("MAX_ARTICLE_LENGTH", &mut settings.max_article_length)?;
        env_parse("FETCH_DELAY_MS", &mut settings.fetch_delay_ms)?;
        env_parse("REQUEST_TIMEOUT_SECS", &mut settings.request_timeout_secs)?;
        env_parse("GRAPH_NEWS_LIMIT", &mut settings.graph_news_limit)?;
        env_parse("GRAPH_PREVIEW_CHARS", &mut settings.graph_preview_chars)?;
        env_parse("KEYWORDS_PER_ARTICLE", &mut settings.keywords_per_article)?;
        env_parse("LOG_LEVEL", &mut settings.log_level)?;
        env_parse("API_HOST", &mut settings.api_host)?;
        env_parse("API_PORT", &mut settings.api_port)?;
        env_parse("QDRANT_URL", &mut settings.qdrant_url)?;
        env_parse("QDRANT_COLLECTION", &mut settings.qdrant_collection)?;
        env_parse("SQLITE_PATH", &mut settings.sqlite_path)?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dimensions == Some(0) {
            return Err(Error::InvalidConfig("embedding_dimensions must be positive".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.fetch_delay_ms == 0 {
            return Err(Error::InvalidConfig(
                "fetch_delay_ms must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_fragment_chars == 0 || self.graph_preview_chars == 0 {
            return Err(Error::InvalidConfig(
                "fragment and preview limits must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
