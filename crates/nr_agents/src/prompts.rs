use nr_core::text::truncate_chars;
use nr_core::Article;

/// Article text beyond this many characters is left out of the analysis prompt.
pub const ANALYSIS_TEXT_CHARS: usize = 1000;

pub fn query_optimization(query: &str) -> String {
    format!(
        "Convert the following user query into an optimized search query for a news API.\n\
         Extract only the key terms and topics, remove question words and common words.\n\
         Return only the optimized search query, nothing else.\n\n\
         User query: \"{}\"\n\n\
         Optimized search query:",
        query
    )
}

pub fn article_analysis(article: &Article) -> String {
    format!(
        "Analyze the following news and determine:\n\
         1. Main topic (1-2 words)\n\
         2. Sentiment (positive/negative/neutral)\n\
         3. Key facts (3-5 points)\n\
         4. Importance (1-10)\n\n\
         Title: {}\n\
         Text: {}\n\n\
         Answer in JSON format:\n\
         {{\n    \"topic\": \"topic\",\n    \"sentiment\": \"sentiment\",\n    \"key_facts\": [\"fact1\", \"fact2\", \"fact3\"],\n    \"importance\": number\n}}",
        article.title,
        truncate_chars(&article.extracted_text, ANALYSIS_TEXT_CHARS)
    )
}

pub fn final_report(query: &str, analysis_json: &str) -> String {
    format!(
        "Based on news analysis for query \"{}\" create a brief final report.\n\n\
         Analysis data:\n{}\n\n\
         Report should contain:\n\
         1. Overall situation assessment\n\
         2. Main topics and trends\n\
         3. Key findings\n\
         4. Recommendations (if applicable)\n\n\
         Report should be in English, structured and informative.",
        query, analysis_json
    )
}
