//! Embedding-weighted scoring.

use super::features::{citation_term, recency_term};
use super::mode::SEMANTIC_WEIGHTS;
use super::ScoringStrategy;
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::Result;
use scholar_search::Record;
use tracing::debug;

/// Scores records by cosine similarity between the query embedding and the
/// embedding of `"<title> <snippet>"`, blended with the citation and
/// recency terms using [`SEMANTIC_WEIGHTS`].
///
/// Records with no title and no snippet are excluded (`None`).
pub struct SemanticStrategy<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> SemanticStrategy<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }
}

/// Text embedded for a record; empty when there is nothing to embed.
pub fn record_text(record: &Record) -> String {
    let title = if record.has_title() {
        record.title.as_str()
    } else {
        ""
    };
    format!("{title} {}", record.snippet).trim().to_string()
}

impl ScoringStrategy for SemanticStrategy<'_> {
    fn score_batch(&self, query: &str, records: &[Record]) -> Result<Vec<Option<f64>>> {
        let texts: Vec<String> = records.iter().map(record_text).collect();
        let embeddable: Vec<&str> = texts
            .iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect();
        debug!(
            total = records.len(),
            embeddable = embeddable.len(),
            "embedding records"
        );
        if embeddable.is_empty() {
            return Ok(vec![None; records.len()]);
        }

        let query_vec = self.embedder.embed(query)?;
        let mut vectors = self.embedder.embed_batch(&embeddable)?.into_iter();

        let w = SEMANTIC_WEIGHTS;
        let mut scores = Vec::with_capacity(records.len());
        for (record, text) in records.iter().zip(&texts) {
            if text.is_empty() {
                scores.push(None);
                continue;
            }
            let Some(vector) = vectors.next() else {
                scores.push(None);
                continue;
            };
            let sim = f64::from(cosine_similarity(&query_vec, &vector));
            let score = w.similarity * sim
                + w.citations * citation_term(record)
                + w.recency * recency_term(record);
            scores.push(Some(score));
        }
        Ok(scores)
    }
}
