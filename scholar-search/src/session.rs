//! Trait definition for the page session that drives the results source.
//!
//! The collector never talks to the network directly; it navigates, waits
//! and reads markup through a [`PageSession`]. [`crate::http::HttpSession`]
//! is the shipped implementation, and tests substitute scripted sessions.

use crate::error::SearchError;
use std::future::Future;
use std::time::Duration;

/// An automation session over the results source.
///
/// A session holds per-run resources (cookies, connections, a browser).
/// The collector calls [`close`](PageSession::close) exactly once at the
/// end of every run, including runs that fail part-way.
pub trait PageSession: Send {
    /// Load `url` as the current page.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the page cannot be requested at all.
    /// A page that loads but shows a challenge is *not* an error.
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), SearchError>> + Send;

    /// Wait until the current page shows the results container.
    ///
    /// `timeout = None` waits without limit. Returns `Ok(false)` when the
    /// timeout lapses without results markup appearing.
    fn wait_for_results(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<bool, SearchError>> + Send;

    /// The current page's HTML.
    fn content(&mut self) -> impl Future<Output = Result<String, SearchError>> + Send;

    /// Release the session's resources.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A session serving a fixed page that either has results or never will.
    struct StaticSession {
        html: String,
        ready: bool,
        closed: bool,
    }

    impl PageSession for StaticSession {
        async fn navigate(&mut self, _url: &str) -> Result<(), SearchError> {
            Ok(())
        }

        async fn wait_for_results(&mut self, _timeout: Option<Duration>) -> Result<bool, SearchError> {
            Ok(self.ready)
        }

        async fn content(&mut self) -> Result<String, SearchError> {
            Ok(self.html.clone())
        }

        async fn close(&mut self) {
            self.closed = true;
        }
    }

    #[test]
    fn static_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<StaticSession>();
    }

    #[tokio::test]
    async fn static_session_round_trip() {
        let mut session = StaticSession {
            html: "<div class=\"gs_ri\"></div>".into(),
            ready: true,
            closed: false,
        };
        session.navigate("https://example.com").await.expect("navigate");
        assert!(session
            .wait_for_results(Some(Duration::from_millis(1)))
            .await
            .expect("wait"));
        assert!(session.content().await.expect("content").contains("gs_ri"));
        session.close().await;
        assert!(session.closed);
    }
}
