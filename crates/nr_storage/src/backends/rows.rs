//! Row shaping shared by the graph backends, so every backend answers a
//! `GraphQuery` with identical rows.

use std::collections::BTreeMap;
use nr_core::storage::{props, Properties};
use nr_core::text::truncate_with_ellipsis;
use nr_core::{GraphRow, NodeKey};

pub fn content_row(properties: &Properties, mut keywords: Vec<String>, preview_chars: usize) -> GraphRow {
    let get = |name: &str| properties.get(name).cloned().unwrap_or_default();
    keywords.sort();
    keywords.dedup();

    GraphRow::Content {
        title: get(props::TITLE),
        url: get(props::URL),
        preview: truncate_with_ellipsis(&get(props::TEXT), preview_chars),
        keywords,
    }
}

fn display_name(key: &NodeKey, properties: &Properties) -> String {
    properties
        .get(props::NAME)
        .filter(|n| !n.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| key.key.clone())
}

/// Every unordered pair of distinct nodes sharing a non-empty `attribute`.
/// Nodes arrive in key order, so `left` always sorts before `right`.
pub fn shared_attribute_pairs<'a, I>(nodes: I, attribute: &str) -> Vec<GraphRow>
where
    I: IntoIterator<Item = (&'a NodeKey, &'a Properties)>,
{
    let mut groups: BTreeMap<String, Vec<(&NodeKey, &Properties)>> = BTreeMap::new();
    for (key, properties) in nodes {
        if let Some(value) = properties.get(attribute) {
            let value = value.trim();
            if !value.is_empty() {
                groups.entry(value.to_string()).or_default().push((key, properties));
            }
        }
    }

    let mut rows = Vec::new();
    for (shared, mut members) in groups {
        members.sort_by(|a, b| a.0.cmp(b.0));
        members.dedup_by(|a, b| a.0 == b.0);
        for (i, (left_key, left_props)) in members.iter().enumerate() {
            for (right_key, right_props) in &members[i + 1..] {
                rows.push(GraphRow::Pair {
                    left: display_name(left_key, left_props),
                    right: display_name(right_key, right_props),
                    shared: shared.clone(),
                });
            }
        }
    }
    rows
}
