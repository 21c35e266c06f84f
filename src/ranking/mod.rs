//! Multi-strategy ranking of a collected record pool.
//!
//! A [`Mode`] is resolved once per call into a [`Strategy`], which scores
//! the whole pool through [`ScoringStrategy::score_batch`]. The engine then
//! drops excluded records, sorts by descending score (stable, so equal
//! scores keep pool order) and truncates to `top_k`.

pub mod features;
pub mod lexical;
pub mod mode;
pub mod posterior;
pub mod semantic;

pub use lexical::LexicalStrategy;
pub use mode::{Mode, Weighting, Weights};
pub use posterior::{PosteriorSettings, PosteriorStrategy};
pub use semantic::SemanticStrategy;

use crate::embedding::Embedder;
use crate::error::{RankError, Result};
use scholar_search::Record;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Scores a pool of records against a query.
pub trait ScoringStrategy {
    /// One entry per record, in order. `None` excludes the record from the
    /// ranked output.
    ///
    /// # Errors
    ///
    /// Strategy-specific: embedding and sampling can fail.
    fn score_batch(&self, query: &str, records: &[Record]) -> Result<Vec<Option<f64>>>;
}

/// A record paired with its ranking score. The record is never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: Record,
    pub score: f64,
}

/// The strategy selected for one ranking call.
pub enum Strategy<'a> {
    Lexical(LexicalStrategy),
    Semantic(SemanticStrategy<'a>),
    Posterior(PosteriorStrategy),
}

impl ScoringStrategy for Strategy<'_> {
    fn score_batch(&self, query: &str, records: &[Record]) -> Result<Vec<Option<f64>>> {
        match self {
            Self::Lexical(s) => s.score_batch(query, records),
            Self::Semantic(s) => s.score_batch(query, records),
            Self::Posterior(s) => s.score_batch(query, records),
        }
    }
}

/// Ranks record pools. Owns the optional embedder used by
/// [`Mode::Semantic`] and the posterior sampler settings.
#[derive(Clone, Default)]
pub struct RankingEngine {
    embedder: Option<Arc<dyn Embedder>>,
    posterior: PosteriorSettings,
}

impl std::fmt::Debug for RankingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingEngine")
            .field("embedder", &self.embedder.is_some())
            .field("posterior", &self.posterior)
            .finish()
    }
}

impl RankingEngine {
    /// An engine without an embedder; semantic ranking will fail.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_posterior(mut self, settings: PosteriorSettings) -> Self {
        self.posterior = settings;
        self
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Resolve `mode` into its scoring strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::EmbedderUnavailable`] for [`Mode::Semantic`]
    /// when no embedder is attached.
    pub fn strategy(&self, mode: Mode) -> Result<Strategy<'_>> {
        Ok(match mode.weighting() {
            Weighting::Lexical(weights) => Strategy::Lexical(LexicalStrategy::new(weights)),
            Weighting::Embedding => {
                let embedder = self.embedder.as_deref().ok_or_else(|| {
                    RankError::EmbedderUnavailable(
                        "semantic mode requires an embedder; attach one with with_embedder"
                            .into(),
                    )
                })?;
                Strategy::Semantic(SemanticStrategy::new(embedder))
            }
            Weighting::Posterior => {
                Strategy::Posterior(PosteriorStrategy::new(self.posterior.clone()))
            }
        })
    }

    /// Rank `pool` for `query` under `mode`, returning at most `top_k`
    /// records (at most one for [`Mode::Single`]) by descending score.
    ///
    /// # Errors
    ///
    /// Returns the selected strategy's errors.
    pub fn rank(
        &self,
        query: &str,
        pool: &[Record],
        mode: Mode,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>> {
        if pool.is_empty() {
            debug!(%mode, "empty pool; nothing to rank");
            return Ok(Vec::new());
        }
        let limit = mode.result_cap().map_or(top_k, |cap| cap.min(top_k));

        let strategy = self.strategy(mode)?;
        let scores = strategy.score_batch(query, pool)?;

        let mut ranked: Vec<ScoredRecord> = pool
            .iter()
            .zip(scores)
            .filter_map(|(record, score)| {
                score.map(|score| ScoredRecord {
                    record: record.clone(),
                    score,
                })
            })
            .collect();
        let excluded = pool.len() - ranked.len();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);

        info!(
            %mode,
            pool = pool.len(),
            excluded,
            returned = ranked.len(),
            "ranked pool"
        );
        Ok(ranked)
    }

    /// [`rank`](Self::rank) with a mode name; unknown names rank as
    /// [`Mode::Balanced`].
    ///
    /// # Errors
    ///
    /// Returns the selected strategy's errors.
    pub fn rank_by_name(
        &self,
        query: &str,
        pool: &[Record],
        mode: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>> {
        self.rank(query, pool, Mode::parse_or_default(mode), top_k)
    }
}
