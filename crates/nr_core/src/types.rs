use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw article record as returned by a news provider, before text extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub source_name: String,
}

impl ArticleMetadata {
    /// Turns provider metadata into an [`Article`].
    ///
    /// Uses the extracted text when there is any, otherwise falls back to
    /// title and description. Returns `None` when neither yields text, so an
    /// `Article` always carries non-empty `extracted_text`.
    pub fn into_article(self, full_text: Option<String>) -> Option<Article> {
        let extracted = full_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| self.fallback_text())?;

        Some(Article {
            title: self.title,
            url: self.url,
            author: self.author,
            description: self.description,
            published_at: self.published_at,
            raw_content: self.content,
            extracted_text: extracted,
            source_name: self.source_name,
        })
    }

    fn fallback_text(&self) -> Option<String> {
        let parts: Vec<&str> = [Some(self.title.as_str()), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_content: Option<String>,
    pub extracted_text: String,
    pub source_name: String,
}

impl Article {
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// A sports team as used by the knowledge graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub venue: Option<String>,
    pub league: Option<String>,
}

/// Bounded slice of an article's text, the unit of vector indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub title: String,
    pub url: String,
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFragment {
    pub source_title: String,
    pub source_url: String,
    pub text_snippet: String,
    /// 1 is the most relevant fragment.
    pub relevance_rank: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(format!("Unknown sentiment: {}", other)),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;
pub const MAX_KEY_FACTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub article_title: String,
    pub topic: String,
    pub sentiment: Sentiment,
    pub key_facts: Vec<String>,
    pub importance: u8,
    pub source_name: String,
}

impl AnalysisRecord {
    pub fn new(
        article_title: impl Into<String>,
        topic: impl Into<String>,
        sentiment: Sentiment,
        mut key_facts: Vec<String>,
        importance: i64,
        source_name: impl Into<String>,
    ) -> Self {
        key_facts.truncate(MAX_KEY_FACTS);
        Self {
            article_title: article_title.into(),
            topic: topic.into(),
            sentiment,
            key_facts,
            importance: importance.clamp(MIN_IMPORTANCE as i64, MAX_IMPORTANCE as i64) as u8,
            source_name: source_name.into(),
        }
    }

    /// Record substituted when the model's answer can't be parsed.
    pub fn fallback(article_title: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            article_title: article_title.into(),
            topic: "Unknown".to_string(),
            sentiment: Sentiment::Neutral,
            key_facts: vec!["Could not analyze".to_string()],
            importance: 5,
            source_name: source_name.into(),
        }
    }
}

/// State threaded through every stage of the analysis workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub query: String,
    pub articles: Vec<Article>,
    pub analysis_records: Vec<AnalysisRecord>,
    pub final_summary: String,
    pub error_message: Option<String>,
    pub step_count: u32,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn has_error(&self) -> bool {
        self.error_message
            .as_deref()
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }
}
