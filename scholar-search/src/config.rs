//! Collector configuration with sensible defaults.
//!
//! [`CollectorConfig`] controls the results wait, the politeness pause
//! between pages, operator signalling and the HTTP page session. The
//! defaults are tuned for polite, human-assisted collection.

use crate::error::SearchError;
use crate::links::HOST_ROOT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed number of entries the results source serves per page.
pub const PAGE_SIZE: usize = 10;

/// Default file name, under `marker_dir`, for operator clearance cookies.
pub const CLEARANCE_COOKIES: &str = "clearance_cookies.txt";

/// Configuration for one collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Host root results pages are requested from.
    pub base_url: String,
    /// How long to wait for the results container before treating the
    /// page as challenged.
    pub results_timeout_secs: u64,
    /// Pause after each page, in milliseconds.
    pub politeness_delay_ms: u64,
    /// Raise the challenge marker and wait for the operator before the
    /// unbounded re-wait. When `false` the collector goes straight to the
    /// unbounded re-wait.
    pub wait_for_operator: bool,
    /// Directory holding the durable challenge/completion marker files.
    pub marker_dir: PathBuf,
    /// How often to check whether the operator removed the challenge marker.
    pub marker_poll_ms: u64,
    /// Per-request HTTP timeout for the page session, in seconds.
    pub request_timeout_secs: u64,
    /// First delay between re-checks of a blocked page while waiting
    /// without limit. Doubles after each re-check.
    pub poll_interval_ms: u64,
    /// Upper bound for the re-check delay.
    pub max_poll_interval_ms: u64,
    /// Where the operator drops clearance cookies. `None` uses
    /// [`CLEARANCE_COOKIES`] inside `marker_dir`.
    pub clearance_cookie_file: Option<PathBuf>,
    /// Custom User-Agent. If `None`, one is picked from a built-in list.
    pub user_agent: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: HOST_ROOT.to_string(),
            results_timeout_secs: 15,
            politeness_delay_ms: 1000,
            wait_for_operator: true,
            marker_dir: PathBuf::from("."),
            marker_poll_ms: 1000,
            request_timeout_secs: 30,
            poll_interval_ms: 2000,
            max_poll_interval_ms: 60_000,
            clearance_cookie_file: None,
            user_agent: None,
        }
    }
}

impl CollectorConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// `base_url` must parse and timeouts and poll intervals must be
    /// non-zero. The politeness delay may be zero.
    pub fn validate(&self) -> Result<(), SearchError> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(SearchError::Config(format!(
                "base_url is not a valid URL: {}",
                self.base_url
            )));
        }
        if self.results_timeout_secs == 0 {
            return Err(SearchError::Config(
                "results_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(SearchError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.marker_poll_ms == 0 {
            return Err(SearchError::Config(
                "marker_poll_ms must be greater than 0".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SearchError::Config(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }
        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(SearchError::Config(
                "max_poll_interval_ms must not be less than poll_interval_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs(self.results_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn marker_poll(&self) -> Duration {
        Duration::from_millis(self.marker_poll_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    /// The clearance cookie file the page session reads.
    pub fn clearance_cookie_path(&self) -> PathBuf {
        self.clearance_cookie_file
            .clone()
            .unwrap_or_else(|| self.marker_dir.join(CLEARANCE_COOKIES))
    }
}

/// Number of pages needed to gather `pool_size` records.
pub fn page_count(pool_size: usize) -> usize {
    pool_size.div_ceil(PAGE_SIZE)
}
