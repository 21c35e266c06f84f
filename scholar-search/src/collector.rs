//! The paginated collection protocol.
//!
//! For each results page the collector walks a small state machine:
//!
//! ```text
//!  Navigate ──► AwaitingResults ──(found)──────────────────────────► Parsing ──► pause ──► next page
//!                     │                                                 ▲
//!                     └─(timeout)──► ChallengePresented ──(operator)──► unbounded re-wait
//! ```
//!
//! After the last page the collector publishes `Complete` and closes the
//! session. The session is closed on every exit path, including errors.
//!
//! The unbounded re-wait after a challenge has no abandonment path: once
//! the operator has been asked to act, the collector waits for the page to
//! become usable for as long as it takes.

use crate::config::{page_count, CollectorConfig};
use crate::error::SearchError;
use crate::http::HttpSession;
use crate::links::page_url_at;
use crate::parse::parse_results_html;
use crate::session::PageSession;
use crate::signal::{CollectorStatus, StatusReporter};
use crate::types::{Record, SortOrder};

/// Drives page sessions through the collection protocol.
#[derive(Debug, Clone)]
pub struct Collector<R> {
    config: CollectorConfig,
    reporter: R,
}

impl<R: StatusReporter> Collector<R> {
    /// Create a collector.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(config: CollectorConfig, reporter: R) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self { config, reporter })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Collect up to `pool_size` records using a fresh [`HttpSession`].
    ///
    /// # Errors
    ///
    /// See [`collect_with`](Self::collect_with).
    pub async fn collect(
        &self,
        query: &str,
        pool_size: usize,
        sort: SortOrder,
    ) -> Result<Vec<Record>, SearchError> {
        let session = HttpSession::new(&self.config)?;
        self.collect_with(session, query, pool_size, sort).await
    }

    /// Collect up to `pool_size` records through `session`.
    ///
    /// Requests `ceil(pool_size / PAGE_SIZE)` pages and returns records in
    /// page-then-entry order, truncated to `pool_size`. The session is
    /// closed before returning, whether or not collection succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if a page cannot be requested, or
    /// [`SearchError::Signal`]/[`SearchError::Io`] if the status reporter
    /// fails. Missing results markup is never an error.
    pub async fn collect_with<S: PageSession>(
        &self,
        mut session: S,
        query: &str,
        pool_size: usize,
        sort: SortOrder,
    ) -> Result<Vec<Record>, SearchError> {
        tracing::trace!(query, pool_size, %sort, "collection starting");
        let outcome = self.run_pages(&mut session, query, pool_size, sort).await;
        session.close().await;

        match outcome {
            Ok(records) => {
                tracing::info!(count = records.len(), "collection complete");
                Ok(records)
            }
            Err(e) => {
                tracing::warn!(error = %e, "collection aborted");
                Err(e)
            }
        }
    }

    async fn run_pages<S: PageSession>(
        &self,
        session: &mut S,
        query: &str,
        pool_size: usize,
        sort: SortOrder,
    ) -> Result<Vec<Record>, SearchError> {
        self.reporter.reset().await?;

        let pages = page_count(pool_size);
        let mut pool: Vec<Record> = Vec::with_capacity(pool_size);

        for page in 0..pages {
            let url = page_url_at(&self.config.base_url, query, page, sort);
            tracing::debug!(page, %url, "requesting results page");
            self.reporter
                .publish(CollectorStatus::Navigating {
                    page,
                    url: url.clone(),
                })
                .await?;
            session.navigate(&url).await?;

            self.reporter
                .publish(CollectorStatus::AwaitingResults { page })
                .await?;
            let found = session
                .wait_for_results(Some(self.config.results_timeout()))
                .await?;

            if !found {
                self.recover_from_challenge(session, page).await?;
            }

            self.reporter
                .publish(CollectorStatus::Parsing { page })
                .await?;
            let html = session.content().await?;
            let records = parse_results_html(&html)?;
            tracing::debug!(page, count = records.len(), "page entries parsed");
            pool.extend(records);

            tokio::time::sleep(self.config.politeness_delay()).await;
        }

        pool.truncate(pool_size);
        self.reporter
            .publish(CollectorStatus::Complete {
                records: pool.len(),
            })
            .await?;
        Ok(pool)
    }

    async fn recover_from_challenge<S: PageSession>(
        &self,
        session: &mut S,
        page: usize,
    ) -> Result<(), SearchError> {
        tracing::warn!(page, "results markup missing; access challenge presumed");

        if self.config.wait_for_operator {
            self.reporter
                .publish(CollectorStatus::ChallengePresented { page })
                .await?;
            self.reporter.await_challenge_cleared().await?;
            tracing::info!(page, "operator cleared challenge; resuming");
        }

        if !session.wait_for_results(None).await? {
            tracing::warn!(page, "page still lacks results markup; parsing what is there");
        }
        Ok(())
    }
}
