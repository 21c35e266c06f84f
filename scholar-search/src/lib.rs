//! # scholar-search
//!
//! Paginated collection of publication records from a scholarly results
//! source, with operator-assisted recovery when the source interposes an
//! automated-access challenge.
//!
//! ## Design
//!
//! - Pages are fetched one at a time through a [`PageSession`]; the shipped
//!   [`HttpSession`] uses `reqwest` with a cookie store and a rotating
//!   browser User-Agent
//! - Each result entry is parsed into a typed [`Record`] with CSS selectors;
//!   malformed entries degrade to defaults instead of failing the page
//! - A page that never shows results markup is treated as a challenge: the
//!   collector publishes [`CollectorStatus::ChallengePresented`] and waits,
//!   without timeout, for a human to clear it
//! - A fixed politeness pause separates consecutive pages
//!
//! ## Operator involvement
//!
//! This crate does not try to get past challenges. It stops, tells the
//! operator (in-process via [`StatusChannel`] or across processes via
//! [`FileMarkers`]) and resumes once the operator says so. With
//! [`HttpSession`] the operator solves the challenge in a browser and
//! hands the clearance over by writing the browser's cookies to the
//! [`CLEARANCE_COOKIES`] file.

pub mod collector;
pub mod config;
pub mod error;
pub mod http;
pub mod links;
pub mod parse;
pub mod session;
pub mod signal;
pub mod types;

pub use collector::Collector;
pub use config::{CollectorConfig, CLEARANCE_COOKIES, PAGE_SIZE};
pub use error::{Result, SearchError};
pub use http::HttpSession;
pub use session::PageSession;
pub use signal::{CollectorStatus, FileMarkers, StatusChannel, StatusReporter};
pub use types::{Record, SortOrder, NO_TITLE};

/// Collect up to `pool_size` records for `query`, signalling challenges
/// through marker files in `config.marker_dir`.
///
/// Convenience wrapper around [`Collector`] with an [`HttpSession`] and
/// [`FileMarkers`].
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration, and
/// otherwise the errors of [`Collector::collect_with`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scholar_search::Result<()> {
/// let config = scholar_search::CollectorConfig::default();
/// let records =
///     scholar_search::collect("bayesian regression", 20, scholar_search::SortOrder::Relevance, &config)
///         .await?;
/// for record in &records {
///     println!("{} ({:?})", record.title, record.publication_year);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn collect(
    query: &str,
    pool_size: usize,
    sort: SortOrder,
    config: &CollectorConfig,
) -> Result<Vec<Record>> {
    let markers = FileMarkers::new(&config.marker_dir, config.marker_poll());
    let collector = Collector::new(config.clone(), markers)?;
    collector.collect(query, pool_size, sort).await
}
