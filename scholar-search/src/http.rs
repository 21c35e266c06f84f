//! HTTP page session with User-Agent rotation and operator cookie hand-off.
//!
//! [`HttpSession`] implements [`PageSession`] on a [`reqwest::Client`] with
//! browser-like headers and a shared cookie [`Jar`]. A fetched page is
//! final, so the bounded wait inspects it once and never re-requests.
//!
//! Plain HTTP has no interface in which a human could solve a challenge.
//! The operator solves it in an ordinary browser and copies the resulting
//! `Cookie` header into the clearance cookie file (see
//! [`CollectorConfig::clearance_cookie_path`]). The session loads that
//! file into its jar before the first request, and again on every
//! re-check during the unbounded wait. New file contents trigger one
//! immediate re-request; otherwise re-checks back off exponentially from
//! `poll_interval_ms` up to `max_poll_interval_ms`.

use crate::config::CollectorConfig;
use crate::error::SearchError;
use crate::parse::has_results;
use crate::session::PageSession;
use rand::seq::SliceRandom;
use reqwest::cookie::Jar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Realistic browser User-Agent strings, one picked per session.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] configured for results pages, storing
/// cookies in `jar`.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &CollectorConfig, jar: Arc<Jar>) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_provider(jar)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Split clearance file contents into `name=value` pairs.
///
/// Accepts a pasted `Cookie:` request header or one pair per line. Blank
/// lines, `#` comments and pieces without `=` are skipped.
pub fn parse_cookie_pairs(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.strip_prefix("Cookie:")
                .or_else(|| line.strip_prefix("cookie:"))
                .unwrap_or(line)
        })
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|pair| pair.split_once('=').is_some_and(|(name, _)| !name.trim().is_empty()))
        .map(str::to_owned)
        .collect()
}

/// A [`PageSession`] backed by plain HTTP requests.
pub struct HttpSession {
    client: reqwest::Client,
    jar: Arc<Jar>,
    cookie_origin: Url,
    cookie_file: PathBuf,
    applied_cookies: Option<String>,
    poll_interval: Duration,
    max_poll_interval: Duration,
    current_url: Option<String>,
    current_html: String,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("current_url", &self.current_url)
            .field("cookie_file", &self.cookie_file)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_interval", &self.max_poll_interval)
            .finish_non_exhaustive()
    }
}

impl HttpSession {
    /// Create a session from collector settings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built, or
    /// [`SearchError::Config`] if `base_url` does not parse.
    pub fn new(config: &CollectorConfig) -> Result<Self, SearchError> {
        let cookie_origin = Url::parse(&config.base_url).map_err(|e| {
            SearchError::Config(format!("base_url is not a valid URL: {e}"))
        })?;
        let jar = Arc::new(Jar::default());
        Ok(Self {
            client: build_client(config, Arc::clone(&jar))?,
            jar,
            cookie_origin,
            cookie_file: config.clearance_cookie_path(),
            applied_cookies: None,
            poll_interval: config.poll_interval(),
            max_poll_interval: config.max_poll_interval(),
            current_url: None,
            current_html: String::new(),
        })
    }

    /// Load the clearance cookie file into the jar if its contents changed
    /// since the last load. Returns `true` when new cookies were applied.
    ///
    /// A missing file means no clearance yet.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Io`] if the file exists but cannot be read.
    pub async fn apply_clearance_cookies(&mut self) -> Result<bool, SearchError> {
        let contents = match tokio::fs::read_to_string(&self.cookie_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if self.applied_cookies.as_deref() == Some(contents.as_str()) {
            return Ok(false);
        }

        let pairs = parse_cookie_pairs(&contents);
        for pair in &pairs {
            self.jar.add_cookie_str(pair, &self.cookie_origin);
        }
        self.applied_cookies = Some(contents);
        tracing::info!(
            cookies = pairs.len(),
            file = %self.cookie_file.display(),
            "clearance cookies loaded"
        );
        Ok(!pairs.is_empty())
    }

    async fn fetch(&self, url: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("results request failed: {e}")))?;

        // Challenge pages come back as 429/403 with a body worth keeping.
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "results page returned non-success status");
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("results response read failed: {e}")))
    }
}

impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SearchError> {
        tracing::trace!(url, "navigating");
        self.apply_clearance_cookies().await?;
        let html = self.fetch(url).await?;
        tracing::trace!(bytes = html.len(), "results page received");
        self.current_url = Some(url.to_string());
        self.current_html = html;
        Ok(())
    }

    async fn wait_for_results(&mut self, timeout: Option<Duration>) -> Result<bool, SearchError> {
        let Some(url) = self.current_url.clone() else {
            return Err(SearchError::Http("wait_for_results called before navigate".into()));
        };
        if has_results(&self.current_html) {
            return Ok(true);
        }
        // The fetched markup cannot change without another request.
        if timeout.is_some() {
            return Ok(false);
        }

        let mut delay = self.poll_interval;
        loop {
            if !self.apply_clearance_cookies().await? {
                tracing::info!(
                    retry_in_ms = delay.as_millis() as u64,
                    cookie_file = %self.cookie_file.display(),
                    "results still blocked; waiting for clearance"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2).min(self.max_poll_interval);
            }

            match self.fetch(&url).await {
                Ok(html) => self.current_html = html,
                Err(e) => tracing::warn!(error = %e, "re-check of blocked page failed"),
            }
            if has_results(&self.current_html) {
                return Ok(true);
            }
        }
    }

    async fn content(&mut self) -> Result<String, SearchError> {
        Ok(self.current_html.clone())
    }

    async fn close(&mut self) {
        self.current_url = None;
        self.current_html.clear();
        tracing::debug!("HTTP session closed");
    }
}
