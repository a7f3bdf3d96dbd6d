//! Keyword extraction for free-text shopping queries.
//!
//! A small rule-based extractor: lowercase, tokenize, drop stop
//! words and short or numeric tokens, then strip plural endings so "boots"
//! and "dresses" match "boot" and "dress" in product text.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "else",
    "even", "ever", "every", "few", "for", "from", "further", "get", "give", "go", "had", "has",
    "have", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "itself", "just", "like", "looking", "make",
    "me", "might", "more", "most", "much", "must", "my", "myself", "need", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "please", "same", "see", "she", "should", "show", "so", "some", "something",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "thing", "this", "those", "through", "to", "too", "under", "until", "up",
    "us", "very", "want", "was", "we", "well", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Extract content keywords from `text`, deduplicated in first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for token in lower.split(|c: char| !(c.is_alphanumeric() || c == '-')) {
        let token = token.trim_matches('-');
        if token.chars().count() <= 2
            || token.chars().all(|c| c.is_ascii_digit())
            || is_stop_word(token)
        {
            continue;
        }
        let lemma = lemmatize(token);
        if lemma.chars().count() <= 2 || is_stop_word(&lemma) {
            continue;
        }
        if seen.insert(lemma.clone()) {
            keywords.push(lemma);
        }
    }

    tracing::debug!("Extracted keywords {:?} from {:?}", keywords, truncate(text, 50));
    keywords
}

/// Whitespace-split query terms with punctuation trimmed and stop words and
/// single characters removed. Unlike [`extract_keywords`], words are kept as
/// typed (no plural stripping).
pub fn prompt_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| w.chars().count() > 1 && !is_stop_word(w))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Strip common English plural endings.
fn lemmatize(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if word.len() > 3 && word.ends_with('s') {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
