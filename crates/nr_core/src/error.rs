use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No articles found")]
    NoArticlesFound,

    #[error("No articles to analyze")]
    NoArticlesToAnalyze,

    #[error("No analysis results to create summary")]
    NoAnalysisResults,

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("{0} not initialized")]
    NotInitialized(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for failures that came from talking to something outside the process.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_) | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_messages_are_stable() {
        assert_eq!(Error::NoArticlesFound.to_string(), "No articles found");
        assert_eq!(Error::NoArticlesToAnalyze.to_string(), "No articles to analyze");
        assert_eq!(
            Error::NoAnalysisResults.to_string(),
            "No analysis results to create summary"
        );
        assert_eq!(
            Error::NotInitialized("Vector index".to_string()).to_string(),
            "Vector index not initialized"
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(Error::Timeout("news".to_string()).is_transport());
        assert!(Error::Transport("reset".to_string()).is_transport());
        assert!(!Error::Generation("bad".to_string()).is_transport());
    }
}
