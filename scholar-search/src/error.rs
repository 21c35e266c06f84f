//! Error types for the scholar-search crate.
//!
//! Errors carry stable string messages suitable for display to users.
//! Malformed result entries and missing results markup are *not* errors:
//! the former degrade to default field values and the latter enters the
//! operator challenge protocol.

/// Errors that can occur while collecting result pages.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An HTTP request to the results source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A CSS selector or pattern failed to compile.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid collector configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The status reporter could not publish or observe a signal.
    #[error("signal error: {0}")]
    Signal(String),

    /// Marker file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for scholar-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http() {
        let err = SearchError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_config() {
        let err = SearchError::Config("results_timeout_secs must be > 0".into());
        assert_eq!(
            err.to_string(),
            "config error: results_timeout_secs must be > 0"
        );
    }

    #[test]
    fn display_signal() {
        let err = SearchError::Signal("status channel closed".into());
        assert_eq!(err.to_string(), "signal error: status channel closed");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SearchError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
