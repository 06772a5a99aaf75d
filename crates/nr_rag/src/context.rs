use nr_core::text::truncate_with_ellipsis;
use nr_core::RetrievedFragment;

/// One labelled piece of retrieved evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    pub label: String,
    pub text: String,
}

impl ContextBlock {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl From<&RetrievedFragment> for ContextBlock {
    fn from(fragment: &RetrievedFragment) -> Self {
        Self::new(fragment.source_title.clone(), fragment.text_snippet.clone())
    }
}

/// Joins blocks into the prompt context, bounding each block's text.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_fragment_chars: usize,
}

impl ContextAssembler {
    pub fn new(max_fragment_chars: usize) -> Self {
        Self { max_fragment_chars }
    }

    pub fn assemble(&self, blocks: &[ContextBlock]) -> String {
        blocks
            .iter()
            .map(|block| {
                format!(
                    "{}: {}",
                    block.label,
                    truncate_with_ellipsis(&block.text, self.max_fragment_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
