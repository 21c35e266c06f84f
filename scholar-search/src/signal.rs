//! Collector status reporting and operator challenge hand-off.
//!
//! The collector publishes every protocol state through a
//! [`StatusReporter`]. When a challenge is presented it blocks in
//! [`StatusReporter::await_challenge_cleared`] until the operator says the
//! page is usable again.
//!
//! Two reporters are provided:
//!
//! - [`StatusChannel`]: in-process, observable through a
//!   [`tokio::sync::watch`] subscription; the operator resumes with
//!   [`StatusChannel::resolve_challenge`].
//! - [`FileMarkers`]: durable marker files for an operator in another
//!   process. The challenge marker is created on a challenge and the
//!   operator deletes it to resume; the completion marker is created when
//!   collection finishes and removed at the start of the next run.

use crate::error::SearchError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// File name of the "challenge active" marker.
pub const CHALLENGE_MARKER: &str = "captcha_flag.txt";

/// File name of the "collection complete" marker.
pub const COMPLETE_MARKER: &str = "scrape_done.txt";

/// One state of the per-page collection protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorStatus {
    /// No run in progress.
    Idle,
    /// Requesting a results page.
    Navigating {
        /// Zero-based page index.
        page: usize,
        /// The page URL.
        url: String,
    },
    /// Waiting (bounded) for the results container.
    AwaitingResults { page: usize },
    /// The page shows an access challenge; a human must resolve it.
    ChallengePresented { page: usize },
    /// Extracting records from the page.
    Parsing { page: usize },
    /// All pages collected.
    Complete {
        /// Number of records returned.
        records: usize,
    },
}

/// Sink for collector state changes and source of operator resolution.
pub trait StatusReporter: Send + Sync {
    /// Clear leftovers from a previous run.
    fn reset(&self) -> impl Future<Output = Result<(), SearchError>> + Send;

    /// Publish a new protocol state.
    fn publish(&self, status: CollectorStatus)
        -> impl Future<Output = Result<(), SearchError>> + Send;

    /// Block, without timeout, until the operator clears the challenge.
    fn await_challenge_cleared(&self) -> impl Future<Output = Result<(), SearchError>> + Send;
}

// ---------------------------------------------------------------------------
// In-process channel
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ChannelInner {
    status: watch::Sender<CollectorStatus>,
    challenge_active: watch::Sender<bool>,
}

/// In-process observable status value.
///
/// Cloning yields another handle to the same channel, so one clone can be
/// handed to the collector and another kept by the operator.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    inner: Arc<ChannelInner>,
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusChannel {
    pub fn new() -> Self {
        let (status, _) = watch::channel(CollectorStatus::Idle);
        let (challenge_active, _) = watch::channel(false);
        Self {
            inner: Arc::new(ChannelInner {
                status,
                challenge_active,
            }),
        }
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<CollectorStatus> {
        self.inner.status.subscribe()
    }

    /// The most recently published status.
    pub fn current(&self) -> CollectorStatus {
        self.inner.status.borrow().clone()
    }

    /// Whether a challenge is waiting for the operator.
    pub fn challenge_active(&self) -> bool {
        *self.inner.challenge_active.borrow()
    }

    /// Operator signal: the challenge has been dealt with.
    pub fn resolve_challenge(&self) {
        self.inner.challenge_active.send_replace(false);
    }
}

impl StatusReporter for StatusChannel {
    async fn reset(&self) -> Result<(), SearchError> {
        self.inner.challenge_active.send_replace(false);
        self.inner.status.send_replace(CollectorStatus::Idle);
        Ok(())
    }

    async fn publish(&self, status: CollectorStatus) -> Result<(), SearchError> {
        if matches!(status, CollectorStatus::ChallengePresented { .. }) {
            self.inner.challenge_active.send_replace(true);
        }
        self.inner.status.send_replace(status);
        Ok(())
    }

    async fn await_challenge_cleared(&self) -> Result<(), SearchError> {
        let mut rx = self.inner.challenge_active.subscribe();
        rx.wait_for(|active| !*active)
            .await
            .map(|_| ())
            .map_err(|e| SearchError::Signal(format!("challenge channel closed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Durable marker files
// ---------------------------------------------------------------------------

/// Marker-file reporter for an operator or watcher in another process.
#[derive(Debug, Clone)]
pub struct FileMarkers {
    dir: PathBuf,
    poll: Duration,
}

impl FileMarkers {
    /// Markers live in `dir`; removal of the challenge marker is checked
    /// every `poll`.
    pub fn new(dir: impl Into<PathBuf>, poll: Duration) -> Self {
        Self {
            dir: dir.into(),
            poll,
        }
    }

    pub fn challenge_path(&self) -> PathBuf {
        self.dir.join(CHALLENGE_MARKER)
    }

    pub fn complete_path(&self) -> PathBuf {
        self.dir.join(COMPLETE_MARKER)
    }

    async fn remove_if_present(path: &Path) -> Result<(), SearchError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl StatusReporter for FileMarkers {
    async fn reset(&self) -> Result<(), SearchError> {
        Self::remove_if_present(&self.complete_path()).await?;
        Self::remove_if_present(&self.challenge_path()).await
    }

    async fn publish(&self, status: CollectorStatus) -> Result<(), SearchError> {
        match status {
            CollectorStatus::ChallengePresented { page } => {
                tracing::info!(
                    page,
                    marker = %self.challenge_path().display(),
                    "challenge marker written; delete it once the challenge is solved"
                );
                tokio::fs::create_dir_all(&self.dir).await?;
                tokio::fs::write(self.challenge_path(), "waiting").await?;
            }
            CollectorStatus::Complete { .. } => {
                tokio::fs::create_dir_all(&self.dir).await?;
                tokio::fs::write(self.complete_path(), "done").await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn await_challenge_cleared(&self) -> Result<(), SearchError> {
        let path = self.challenge_path();
        while tokio::fs::try_exists(&path).await? {
            tokio::time::sleep(self.poll).await;
        }
        Ok(())
    }
}
