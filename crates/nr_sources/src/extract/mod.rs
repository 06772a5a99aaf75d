use scraper::{Html, Selector};
use nr_core::text::{normalize_whitespace, truncate_chars};

pub mod jsonld;

/// Paragraphs shorter than this are navigation, captions or ads.
const MIN_PARAGRAPH_CHARS: usize = 80;

const NOISE_PATTERNS: &[&str] = &[
    "see all",
    "daily digest",
    "all rights reserved",
    "this is the title for the native ad",
    "subscribe",
    "sign up",
];

/// Best-effort readable text for an article page.
///
/// Several extractors each propose a candidate (JSON-LD `articleBody`, the
/// `<article>` element, filtered paragraphs); the longest non-empty one wins
/// and is cut to `max_chars` characters.
pub fn extract_article_text(html: &str, max_chars: usize) -> Option<String> {
    let document = Html::parse_document(html);

    let candidates = [
        jsonld::extract_article_body(&document),
        article_element_text(&document),
        filtered_paragraphs(&document),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|c| normalize_whitespace(&c))
        .filter(|c| !c.is_empty())
        .max_by_key(|c| c.chars().count())
        .map(|best| truncate_chars(&best, max_chars).to_string())
}

fn article_element_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("article").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
}

fn filtered_paragraphs(document: &Html) -> Option<String> {
    let selector = Selector::parse("p").ok()?;
    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .collect();

    let kept = filter_paragraphs(&paragraphs);
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

/// Drop short, boilerplate and duplicate paragraphs, keeping document order.
pub fn filter_paragraphs(paragraphs: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut kept = Vec::new();

    for paragraph in paragraphs {
        let text = normalize_whitespace(paragraph);
        let lower = text.to_lowercase();

        if text.chars().count() < MIN_PARAGRAPH_CHARS {
            continue;
        }
        if NOISE_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
            continue;
        }
        if !seen.insert(lower) {
            continue;
        }
        kept.push(text);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(sentence: &str) -> String {
        format!("{} {}", sentence, "The game went to overtime after a late equalizer.".repeat(2))
    }

    #[test]
    fn test_filter_paragraphs() {
        let body = long("Boston won on Sunday.");
        let paragraphs = vec![
            "Short caption".to_string(),
            body.clone(),
            body.to_uppercase(),
            long("Subscribe to our newsletter for more."),
            long("Second   paragraph\nwith odd spacing."),
        ];
        let kept = filter_paragraphs(&paragraphs);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], body);
        assert!(kept[1].starts_with("Second paragraph with odd spacing."));
    }

    #[test]
    fn test_prefers_longest_candidate() {
        let html = format!(
            r#"<html><body>
                <article><h1>Headline</h1><p>Tiny.</p></article>
                <p>{}</p>
                <p>{}</p>
            </body></html>"#,
            long("First real paragraph."),
            long("Second real paragraph.")
        );
        let text = extract_article_text(&html, 10_000).unwrap();
        assert!(text.contains("First real paragraph."));
        assert!(text.contains("Second real paragraph."));
    }

    #[test]
    fn test_cuts_to_max_chars() {
        let html = format!("<article>{}</article>", "word ".repeat(200));
        let text = extract_article_text(&html, 50).unwrap();
        assert_eq!(text.chars().count(), 50);
    }

    #[test]
    fn test_empty_page_yields_none() {
        assert!(extract_article_text("<html><body></body></html>", 100).is_none());
    }
}
