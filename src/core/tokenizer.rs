use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Common function words dropped by keyword extraction
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "him", "his", "how", "its", "may", "new", "now", "old",
    "see", "two", "way", "who", "did", "get", "let", "say", "she", "too", "use", "with", "this",
    "that", "from", "they", "will", "would", "there", "their", "what", "about", "which", "when",
    "make", "like", "into", "than", "them", "then", "some", "could", "other", "been", "were",
    "also", "only", "over", "such", "where", "your", "want", "looking", "need", "job", "jobs",
    "position", "positions", "role", "roles", "work",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Reduce free text to an ordered list of distinct lowercase keywords.
///
/// Non-word characters become whitespace, tokens of two characters or less
/// and stop words are dropped, first occurrence wins.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .filter(|token| !STOP_WORD_SET.contains(token))
        .filter(|token| seen.insert(token.to_string()))
        .map(str::to_string)
        .collect()
}

/// Generic word tokenizer used by the scorer: lowercase alphanumeric runs,
/// no length or stop-word filtering.
pub fn tokenize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
