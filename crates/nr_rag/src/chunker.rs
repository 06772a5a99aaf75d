use nr_core::{Article, Chunk, Error, Result};

/// Splits text into windows of at most `chunk_size` characters, each starting
/// `chunk_overlap` characters before the previous one ended. Windows are cut
/// at the last whitespace in their second half and restart on a word boundary
/// when the text allows it. A window shorter than the overlap is followed
/// without any overlap, so neighbours never share more than `chunk_overlap`
/// characters.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let mut end = (start + self.chunk_size).min(chars.len());
            if end < chars.len() {
                let floor = start + self.chunk_size / 2;
                if let Some(ws) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                    end = ws;
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end >= chars.len() {
                break;
            }
            let mut next = match end.checked_sub(self.chunk_overlap) {
                Some(back) if back > start => back,
                _ => end,
            };
            if !chars[next - 1].is_whitespace() {
                if let Some(ws) = (next..end).find(|&i| chars[i].is_whitespace()) {
                    next = ws + 1;
                }
            }
            start = next;
        }

        chunks
    }

    pub fn chunk_article(&self, article: &Article) -> Vec<Chunk> {
        self.split(&article.extracted_text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk {
                text,
                title: article.title.clone(),
                url: article.url.clone(),
                ordinal,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(50, 50).is_err());
        assert!(TextChunker::new(50, 10).is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = TextChunker::new(500, 50).unwrap();
        assert_eq!(chunker.split("  one small text "), vec!["one small text"]);
        assert!(chunker.split("").is_empty());
    }

    #[test]
    fn test_chunks_are_bounded_and_overlap() {
        let chunker = TextChunker::new(40, 10).unwrap();
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
        }
        // windows break on whitespace, so no word is split
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"].contains(&word));
            }
        }
        // overlap: each chunk shares its first word with the end of the previous one
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].contains(first_word));
        }
    }

    fn shared_chars(previous: &str, next: &str) -> usize {
        let previous: Vec<char> = previous.chars().collect();
        let next: Vec<char> = next.chars().collect();
        (1..=previous.len().min(next.len()))
            .rev()
            .find(|&n| previous[previous.len() - n..] == next[..n])
            .unwrap_or(0)
    }

    #[test]
    fn test_long_words_do_not_overlap_past_the_window() {
        let chunker = TextChunker::new(100, 60).unwrap();
        let words: Vec<String> = ('a'..='f').map(|c| c.to_string().repeat(55)).collect();
        let text = words.join(" ");
        assert_eq!(text.chars().count(), 335);

        let chunks = chunker.split(&text);
        assert_eq!(chunks, words);
        for pair in chunks.windows(2) {
            assert!(shared_chars(&pair[0], &pair[1]) <= 60);
        }
    }

    #[test]
    fn test_overlap_is_bounded() {
        let chunker = TextChunker::new(60, 20).unwrap();
        let text = "Lakers edge Celtics in overtime thriller at the arena tonight ".repeat(8);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let shared = shared_chars(&pair[0], &pair[1]);
            assert!(shared > 0);
            assert!(shared <= 20);
        }
    }

    #[test]
    fn test_unbroken_text_still_progresses() {
        let chunker = TextChunker::new(10, 9).unwrap();
        let chunks = chunker.split(&"x".repeat(25));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.last().unwrap().ends_with('x'));
    }
}
