use serde::Deserialize;
use serde_json::Value;
use nr_core::{AnalysisRecord, Sentiment};

#[derive(Deserialize)]
struct RawAnalysis {
    topic: String,
    #[serde(default)]
    sentiment: String,
    #[serde(default)]
    key_facts: Vec<String>,
    importance: Value,
}

fn importance(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// The JSON object in a model answer, tolerating markdown code fences and
/// chatter around it.
fn json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// Structured record from the model's answer, or the fallback record when
/// the answer is not the JSON object that was asked for.
pub fn parse_analysis(raw: &str, article_title: &str, source_name: &str) -> AnalysisRecord {
    let parsed = json_object(raw)
        .and_then(|json| serde_json::from_str::<RawAnalysis>(json).ok())
        .and_then(|analysis| importance(&analysis.importance).map(|i| (analysis, i)));

    match parsed {
        Some((analysis, importance)) => AnalysisRecord::new(
            article_title,
            analysis.topic,
            analysis.sentiment.parse().unwrap_or(Sentiment::Neutral),
            analysis.key_facts,
            importance,
            source_name,
        ),
        None => {
            tracing::warn!("Could not parse analysis for '{}', using fallback", article_title);
            AnalysisRecord::fallback(article_title, source_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_answer() {
        let raw = r#"{"topic": "AI", "sentiment": "Positive", "key_facts": ["a", "b", "c"], "importance": 8}"#;
        let record = parse_analysis(raw, "Title", "Wire");
        assert_eq!(record.topic, "AI");
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.importance, 8);
        assert_eq!(record.source_name, "Wire");
    }

    #[test]
    fn test_code_fences_are_tolerated() {
        let raw = "Here you go:\n```json\n{\"topic\": \"Chips\", \"sentiment\": \"negative\", \"key_facts\": [\"x\"], \"importance\": \"7\"}\n```";
        let record = parse_analysis(raw, "Title", "Wire");
        assert_eq!(record.topic, "Chips");
        assert_eq!(record.importance, 7);
    }

    #[test]
    fn test_importance_is_clamped_and_facts_bounded() {
        let raw = r#"{"topic": "t", "sentiment": "meh", "key_facts": ["1","2","3","4","5","6","7"], "importance": 15}"#;
        let record = parse_analysis(raw, "Title", "Wire");
        assert_eq!(record.importance, 10);
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert_eq!(record.key_facts.len(), 5);

        let raw = r#"{"topic": "t", "sentiment": "neutral", "key_facts": [], "importance": -3}"#;
        assert_eq!(parse_analysis(raw, "Title", "Wire").importance, 1);
    }

    #[test]
    fn test_malformed_answer_falls_back() {
        for raw in ["not json at all", "{\"topic\": \"t\"}", "{\"topic\": \"t\", \"importance\": \"high\"}", "}{"] {
            let record = parse_analysis(raw, "Title", "Wire");
            assert_eq!(record, AnalysisRecord::fallback("Title", "Wire"));
            assert_eq!(record.importance, 5);
            assert_eq!(record.sentiment, Sentiment::Neutral);
        }
    }
}
