//! Error types for saturated.

/// Result type alias for saturated.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for batcher construction.
///
/// Queue operations themselves never fail: `push` never rejects, and a
/// consumer that panics propagates its panic unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// No tokio runtime to schedule the flush timer on.
    #[error("no tokio runtime available for the flush timer")]
    NoRuntime,
}
