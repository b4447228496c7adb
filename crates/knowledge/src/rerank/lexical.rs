//! BM25 relevance scoring over the candidate set.
//!
//! ```text
//! score(q, D) = Σ IDF(t) · f(t,D)·(k1+1) / (f(t,D) + k1·(1 - b + b·|D|/avgdl))
//! IDF(t)      = ln((N - n(t) + 0.5) / (n(t) + 0.5) + 1)
//! ```
//!
//! Document statistics are taken from the passages being scored, so the
//! reranker needs no corpus or model of its own.

use super::Reranker;
use async_trait::async_trait;
use dossier_core::AppResult;
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

const STOP_WORDS: &[&str] = &[
    "a", "also", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "could", "did",
    "do", "does", "for", "from", "had", "has", "have", "how", "if", "in", "is", "it", "its", "may",
    "not", "of", "on", "or", "so", "than", "that", "the", "their", "then", "there", "they",
    "this", "to", "was", "we", "were", "what", "when", "where", "which", "who", "will", "with",
    "would",
];

/// Local BM25 reranker.
#[derive(Debug, Clone)]
pub struct LexicalReranker {
    k1: f64,
    b: f64,
}

impl LexicalReranker {
    /// Standard parameters: k1 = 1.5, b = 0.75.
    pub fn new() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }

    pub fn with_params(k1: f64, b: f64) -> Self {
        Self {
            k1: k1.clamp(0.0, 3.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|t| t.chars().count() > 1 && STOP_WORDS.binary_search(&t.as_str()).is_err())
            .collect()
    }

    fn score_all(&self, query: &str, passages: &[String]) -> Vec<f32> {
        let mut seen = HashSet::new();
        let query_terms: Vec<String> = Self::tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        if query_terms.is_empty() || passages.is_empty() {
            return vec![0.0; passages.len()];
        }

        let docs: Vec<Vec<String>> = passages.iter().map(|p| Self::tokenize(p)).collect();
        let n = docs.len() as f64;
        let avgdl = (docs.iter().map(Vec::len).sum::<usize>() as f64 / n).max(1.0);

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let idf: Vec<f64> = query_terms
            .iter()
            .map(|t| {
                let n_t = df.get(t.as_str()).copied().unwrap_or(0) as f64;
                ((n - n_t + 0.5) / (n_t + 0.5) + 1.0).ln()
            })
            .collect();

        docs.iter()
            .map(|doc| {
                let length_norm = 1.0 - self.b + self.b * (doc.len() as f64 / avgdl);
                let score: f64 = query_terms
                    .iter()
                    .zip(&idf)
                    .map(|(term, idf)| {
                        let tf = doc.iter().filter(|t| *t == term).count() as f64;
                        if tf == 0.0 {
                            0.0
                        } else {
                            idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * length_norm)
                        }
                    })
                    .sum();
                score as f32
            })
            .collect()
    }
}

impl Default for LexicalReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    fn name(&self) -> &str {
        "lexical"
    }

    fn model(&self) -> &str {
        "bm25"
    }

    async fn score(&self, query: &str, passages: &[String]) -> AppResult<Vec<f32>> {
        let scores = self.score_all(query, passages);
        tracing::debug!(passages = passages.len(), "Scored passages with BM25");
        Ok(scores)
    }
}
