//! Lexical-weighted scoring: title similarity blended with citation and
//! recency terms.

use super::features::{citation_term, lexical_similarity, recency_term};
use super::mode::Weights;
use super::ScoringStrategy;
use crate::error::Result;
use scholar_search::Record;

/// Weighted sum of `lexical_similarity`, `citation_term` and `recency_term`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalStrategy {
    weights: Weights,
}

impl LexicalStrategy {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    /// Score one record. Never fails and never excludes.
    pub fn score(&self, query: &str, record: &Record) -> f64 {
        let w = self.weights;
        w.similarity * lexical_similarity(query, record)
            + w.citations * citation_term(record)
            + w.recency * recency_term(record)
    }
}

impl ScoringStrategy for LexicalStrategy {
    fn score_batch(&self, query: &str, records: &[Record]) -> Result<Vec<Option<f64>>> {
        Ok(records
            .iter()
            .map(|record| Some(self.score(query, record)))
            .collect())
    }
}
