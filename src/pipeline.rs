//! Collect-then-rank pipeline.

use crate::error::{RankError, Result};
use crate::ranking::{Mode, RankingEngine, ScoredRecord};
use scholar_search::{Collector, HttpSession, PageSession, Record, SortOrder, StatusReporter};
use serde::Serialize;
use tracing::info;

/// Pool size used by [`Mode::Single`].
pub const SINGLE_POOL_SIZE: usize = 10;

/// One pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub query: String,
    pub pool_size: usize,
    pub top_k: usize,
    pub mode: Mode,
    pub sort: SortOrder,
}

impl PipelineRequest {
    /// The request as actually run: [`Mode::Single`] collects
    /// [`SINGLE_POOL_SIZE`] records and keeps one.
    pub fn effective(&self) -> Self {
        let mut request = self.clone();
        if self.mode == Mode::Single {
            request.pool_size = SINGLE_POOL_SIZE;
            request.top_k = 1;
        }
        request
    }
}

/// Ranked output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub query: String,
    pub mode: Mode,
    /// Records collected before ranking.
    pub pool_size: usize,
    pub ranked: Vec<ScoredRecord>,
}

/// Collect with a fresh [`HttpSession`], then rank.
///
/// # Errors
///
/// Returns collection errors as [`RankError::Search`](crate::error::RankError::Search)
/// and ranking errors unchanged.
pub async fn run_pipeline<R: StatusReporter>(
    request: &PipelineRequest,
    collector: &Collector<R>,
    engine: &RankingEngine,
) -> Result<PipelineOutput> {
    let session = HttpSession::new(collector.config())?;
    run_pipeline_with(request, collector, session, engine).await
}

/// [`run_pipeline`] over a caller-supplied page session.
///
/// # Errors
///
/// See [`run_pipeline`].
pub async fn run_pipeline_with<R: StatusReporter, S: PageSession>(
    request: &PipelineRequest,
    collector: &Collector<R>,
    session: S,
    engine: &RankingEngine,
) -> Result<PipelineOutput> {
    let request = request.effective();
    let pool = collector
        .collect_with(session, &request.query, request.pool_size, request.sort)
        .await?;
    info!(retrieved = pool.len(), query = %request.query, "records retrieved");

    let pool_size = pool.len();
    let ranked = rank_blocking(engine, &request, pool).await?;
    info!(
        filtered = ranked.len(),
        mode = %request.mode,
        "records ranked"
    );

    Ok(PipelineOutput {
        query: request.query,
        mode: request.mode,
        pool_size,
        ranked,
    })
}

/// Rank on the blocking pool; embedding inference and posterior sampling
/// must not stall the async worker.
async fn rank_blocking(
    engine: &RankingEngine,
    request: &PipelineRequest,
    pool: Vec<Record>,
) -> Result<Vec<ScoredRecord>> {
    let engine = engine.clone();
    let query = request.query.clone();
    let (mode, top_k) = (request.mode, request.top_k);
    tokio::task::spawn_blocking(move || engine.rank(&query, &pool, mode, top_k))
        .await
        .map_err(|e| RankError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: Mode) -> PipelineRequest {
        PipelineRequest {
            query: "q".into(),
            pool_size: 100,
            top_k: 10,
            mode,
            sort: SortOrder::Relevance,
        }
    }

    #[test]
    fn single_forces_small_pool_and_one_result() {
        let effective = request(Mode::Single).effective();
        assert_eq!(effective.pool_size, SINGLE_POOL_SIZE);
        assert_eq!(effective.top_k, 1);
    }

    #[test]
    fn other_modes_keep_request_sizes() {
        for mode in Mode::ALL.into_iter().filter(|m| *m != Mode::Single) {
            assert_eq!(request(mode).effective(), request(mode));
        }
    }
}
