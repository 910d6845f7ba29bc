//! Error types for mirror operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MirrorError>;

/// Crate-wide error taxonomy.
///
/// `Config` and `Discovery` are fatal to the whole run: a bad configuration
/// means nothing can start, and an incomplete catalog would silently
/// under-sync. The stage-scoped variants (`ExistenceCheck`, `Fetch`,
/// `Relabel`, `Publish`, `Verify`) are caught inside the per-task pipeline
/// and converted into a failed outcome without aborting sibling tasks.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Missing or malformed configuration, raised before any discovery
    #[error("Configuration error: {0}")]
    Config(String),

    /// Repository/tag listing failed after retry exhaustion
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Existence probe failed after retry exhaustion (distinct from a
    /// genuine not-found, which is `Ok(false)`)
    #[error("Existence check failed: {0}")]
    ExistenceCheck(String),

    /// Pulling the source image failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Local re-tagging for the destination failed
    #[error("Relabel failed: {0}")]
    Relabel(String),

    /// Pushing to the destination failed
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Post-publish existence verification failed
    #[error("Verify failed: {0}")]
    Verify(String),

    /// Network/transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Response parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// File IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Resource definitively absent (as opposed to a failed probe)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl MirrorError {
    /// Whether retrying the failed operation can possibly succeed.
    ///
    /// A malformed configuration or an unparseable response stays broken no
    /// matter how often the call is re-issued; transient network errors are
    /// the retry target.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            MirrorError::Config(_) | MirrorError::Parse(_) | MirrorError::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for MirrorError {
    fn from(err: reqwest::Error) -> Self {
        MirrorError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(err: serde_json::Error) -> Self {
        MirrorError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(err: std::io::Error) -> Self {
        MirrorError::Io(err.to_string())
    }
}

impl From<url::ParseError> for MirrorError {
    fn from(err: url::ParseError) -> Self {
        MirrorError::Config(err.to_string())
    }
}
