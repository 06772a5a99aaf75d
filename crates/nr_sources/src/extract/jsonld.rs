use scraper::{Html, Selector};
use serde_json::Value;

/// Extracts the `articleBody` published in JSON-LD metadata, if any.
/// Publishers nest it under `@graph` or inside arrays, so the whole tree is searched.
pub fn extract_article_body(document: &Html) -> Option<String> {
    let script_selector = Selector::parse("script[type='application/ld+json']").ok()?;

    document
        .select(&script_selector)
        .filter_map(|script| {
            serde_json::from_str::<Value>(script.text().collect::<String>().trim()).ok()
        })
        .filter_map(|json| find_article_body(&json))
        .max_by_key(|body| body.len())
}

fn find_article_body(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => {
            if let Some(body) = obj.get("articleBody").and_then(|b| b.as_str()) {
                if !body.trim().is_empty() {
                    return Some(body.trim().to_string());
                }
            }
            obj.values().find_map(find_article_body)
        }
        Value::Array(arr) => arr.iter().find_map(find_article_body),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_body_in_graph() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "WebPage", "name": "Home"},
                {"@type": "NewsArticle", "articleBody": "The Kings beat the Ducks 3-2."}
            ]}
            </script>
            </head><body></body></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(
            extract_article_body(&document).as_deref(),
            Some("The Kings beat the Ducks 3-2.")
        );
    }

    #[test]
    fn test_missing_or_broken_json_ld() {
        let html = r#"<script type="application/ld+json">{not json</script><p>Body</p>"#;
        let document = Html::parse_document(html);
        assert!(extract_article_body(&document).is_none());
    }
}
