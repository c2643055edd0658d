//! Text similarity used by clustering and timeline lookup.
//!
//! Everything here is a pure function over ASCII-oriented tokenisation:
//! lower-case, drop anything that is not a letter, digit, underscore or
//! whitespace, split on whitespace.

use std::collections::BTreeSet;

use crate::article::Article;

/// Below this title similarity two articles never count as similar, however
/// much their bodies overlap.
pub const TITLE_GATE: f64 = 0.3;

const TITLE_WEIGHT: f64 = 0.6;
const CONTENT_WEIGHT: f64 = 0.4;
const PHRASE_BONUS: f64 = 0.1;
const MAX_PHRASE_BONUS: f64 = 0.3;
const PHRASE_LEN: usize = 3;
const MIN_TOKEN_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
  "about", "above", "after", "again", "against", "also", "amid", "another",
  "because", "been", "before", "being", "below", "between", "both", "could",
  "does", "doing", "down", "during", "each", "every", "from", "further",
  "have", "having", "here", "into", "just", "more", "most", "much", "must",
  "only", "other", "over", "same", "says", "said", "should", "some", "such",
  "than", "that", "their", "them", "then", "there", "these", "they", "this",
  "those", "through", "under", "until", "upon", "very", "were", "what",
  "when", "where", "which", "while", "will", "with", "within", "without",
  "would", "your",
];

fn is_stop_word(token: &str) -> bool { STOP_WORDS.contains(&token) }

fn clean(text: &str) -> String {
  text
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
    .map(|c| c.to_ascii_lowercase())
    .collect()
}

/// The tokens that carry meaning: longer than three characters and not a
/// stop word.
pub fn significant_words(text: &str) -> BTreeSet<String> {
  clean(text)
    .split_whitespace()
    .filter(|t| t.len() >= MIN_TOKEN_LEN && !is_stop_word(t))
    .map(str::to_owned)
    .collect()
}

/// Jaccard index of two word sets; 0 when either is empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
  if a.is_empty() || b.is_empty() {
    return 0.0;
  }
  let inter = a.intersection(b).count() as f64;
  let union = a.union(b).count() as f64;
  inter / union
}

/// Jaccard similarity over significant words.
pub fn word_similarity(a: &str, b: &str) -> f64 {
  jaccard(&significant_words(a), &significant_words(b))
}

/// Three-token windows over the cleaned title. Punctuation is dropped first,
/// so a comma or quote mark never splits a phrase.
fn phrases(text: &str) -> BTreeSet<String> {
  let cleaned = clean(text);
  let tokens: Vec<&str> = cleaned.split_whitespace().collect();
  tokens
    .windows(PHRASE_LEN)
    .map(|w| w.join(" "))
    .collect()
}

/// Word similarity plus a bonus for shared three-word phrases, clamped to 1.
pub fn title_similarity(a: &str, b: &str) -> f64 {
  let base = word_similarity(a, b);
  let shared = phrases(a).intersection(&phrases(b)).count() as f64;
  let bonus = (shared * PHRASE_BONUS).min(MAX_PHRASE_BONUS);
  (base + bonus).min(1.0)
}

/// Weighted title + body similarity, gated on the titles.
pub fn article_similarity(a: &Article, b: &Article) -> f64 {
  let title = title_similarity(&a.title, &b.title);
  if title < TITLE_GATE {
    return 0.0;
  }
  let content = word_similarity(&a.body(), &b.body());
  TITLE_WEIGHT * title + CONTENT_WEIGHT * content
}
