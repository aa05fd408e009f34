//! TF-IDF relevance scoring with a hand-weighted keyword vocabulary.
//!
//! Every call builds a fresh corpus from its input, so scores are only
//! comparable between documents scored in the same call. The weighting
//! mirrors the common TF-IDF defaults:
//!
//! - tokens: lower-cased runs of two or more word characters
//! - tf: raw term count
//! - idf: `ln((1 + n) / (1 + df)) + 1`
//! - each document vector is L2-normalised
//!
//! A document's score is the sum of `tfidf(term) * weight(term)` over the
//! keywords it contains. Documents without any keyword fall back to the
//! Euclidean norm of their vector, which is a different scale; see DESIGN.md.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, instrument};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Domain keywords and their manually assigned weights.
///
/// Multi-word entries never match the single-token vocabulary.
pub const KEYWORD_WEIGHTS: &[(&str, f64)] = &[
    ("gpt", 3.0),
    ("openai", 3.0),
    ("chatgpt", 3.0),
    ("midjourney", 2.5),
    ("diffusion", 2.0),
    ("neural", 2.0),
    ("нейросеть", 2.5),
    ("нейросети", 2.5),
    ("python", 2.5),
    ("fastapi", 2.0),
    ("django", 2.0),
    ("data", 1.5),
    ("big data", 2.0),
    ("spark", 2.0),
    ("kafka", 2.0),
    ("security", 1.5),
    ("vulnerability", 1.5),
];

fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Score a batch of documents; the output has the input's length and order.
#[instrument(level = "debug", skip_all, fields(docs = texts.len()))]
pub fn compute_tfidf_scores<S: AsRef<str>>(texts: &[S]) -> Vec<f64> {
    if texts.is_empty() {
        return Vec::new();
    }

    let term_counts: Vec<HashMap<String, f64>> = texts
        .iter()
        .map(|text| {
            let mut counts = HashMap::new();
            for token in tokenize(&text.as_ref().to_lowercase()) {
                *counts.entry(token).or_insert(0.0) += 1.0;
            }
            counts
        })
        .collect();

    let mut doc_freq: HashMap<&str, f64> = HashMap::new();
    for counts in &term_counts {
        for term in counts.keys() {
            *doc_freq.entry(term.as_str()).or_insert(0.0) += 1.0;
        }
    }

    let n_docs = texts.len() as f64;
    let idf = |term: &str| -> f64 {
        let df = doc_freq.get(term).copied().unwrap_or(0.0);
        ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
    };

    let keywords: Vec<(&str, f64)> = KEYWORD_WEIGHTS
        .iter()
        .filter(|(kw, _)| doc_freq.contains_key(kw))
        .copied()
        .collect();
    debug!(vocabulary = doc_freq.len(), keywords = keywords.len(), "Built TF-IDF corpus");

    term_counts
        .iter()
        .map(|counts| {
            let raw: HashMap<&str, f64> = counts
                .iter()
                .map(|(term, tf)| (term.as_str(), tf * idf(term)))
                .collect();
            let norm = raw.values().map(|w| w * w).sum::<f64>().sqrt();
            let weight_of = |term: &str| -> f64 {
                match raw.get(term) {
                    Some(w) if norm > 0.0 => w / norm,
                    _ => 0.0,
                }
            };

            let keyword_score: f64 = keywords
                .iter()
                .map(|(kw, weight)| weight_of(kw) * weight)
                .filter(|contribution| *contribution > 0.0)
                .sum();

            if keyword_score == 0.0 {
                // Norm of the normalised vector: 1.0, or 0.0 for a token-free document.
                raw.keys().map(|t| weight_of(t).powi(2)).sum::<f64>().sqrt()
            } else {
                keyword_score
            }
        })
        .collect()
}
