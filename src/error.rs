//! Error types for ranking and the renderscholar pipeline.

use scholar_search::SearchError;

/// Top-level error type for renderscholar.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// The semantic mode was requested but no embedder is attached.
    #[error("embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    /// Embedding model download, load or inference error.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Posterior sampler failure (degenerate system, worker panic).
    #[error("sampler error: {0}")]
    Sampler(String),

    /// The blocking ranking task panicked or was cancelled.
    #[error("ranking task failed: {0}")]
    Task(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Results collection error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, RankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_embedder_unavailable() {
        let err = RankError::EmbedderUnavailable("semantic mode needs an embedder".into());
        assert_eq!(
            err.to_string(),
            "embedder unavailable: semantic mode needs an embedder"
        );
    }

    #[test]
    fn search_error_is_transparent() {
        let err: RankError = SearchError::Http("connection refused".into()).into();
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RankError>();
    }
}
