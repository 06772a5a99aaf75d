pub const ELLIPSIS: &str = "...";

/// Cut `text` to `limit` characters and append [`ELLIPSIS`] when anything was cut.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Cut `text` to at most `limit` characters without a marker.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Collapse every whitespace run into a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
