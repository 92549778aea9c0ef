//! Combined relevance score.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").expect("valid word regex");
}

/// Distinct lower-cased word tokens of `query`, in first-occurrence order.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    WORD.find_iter(query)
        .map(|m| m.as_str().to_lowercase())
        .filter(|kw| seen.insert(kw.clone()))
        .collect()
}

/// Number of `keywords` occurring anywhere in the lower-cased `title`.
///
/// Matching is by substring, so "vase" also matches "vases".
pub fn title_matches(keywords: &[String], title: &str) -> usize {
    let title = title.to_lowercase();
    keywords.iter().filter(|kw| title.contains(kw.as_str())).count()
}

/// `vector_score + text_score + bonus * title matches`
pub fn combined_score(
    vector_score: f32,
    text_score: f32,
    keywords: &[String],
    title: &str,
    bonus: f32,
) -> f32 {
    vector_score + text_score + bonus * title_matches(keywords, title) as f32
}
