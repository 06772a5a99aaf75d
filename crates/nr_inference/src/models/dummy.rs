use std::fmt;
use nr_core::{CompletionOptions, InferenceModel, Result};

/// Offline stand-in for a real model: answers with the first words of the
/// last paragraph of the prompt. Deterministic, useful for demos and tests.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

const ANSWER_WORDS: usize = 20;

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let last_paragraph = prompt
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .last()
            .unwrap_or("");

        let limit = options
            .max_tokens
            .map(|t| (t as usize).min(ANSWER_WORDS))
            .unwrap_or(ANSWER_WORDS);
        let words: Vec<&str> = last_paragraph.split_whitespace().take(limit).collect();
        Ok(words.join(" "))
    }
}
