//! Error types for upstream MediaWiki operations.

/// Error type for connector and projection failures.
///
/// Transport and status errors are retried by the connector before they
/// surface; payload errors are raised by the transformer and projector when
/// the upstream JSON does not have the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP request itself failed (connect, timeout, body decode).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {status} for {url}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// The upstream payload is missing a structure we rely on.
    #[error("malformed upstream payload: {0}")]
    Payload(String),
}

impl Error {
    /// Shorthand for a [`Error::Payload`] with a formatted message.
    pub(crate) fn payload(message: impl Into<String>) -> Self {
        Error::Payload(message.into())
    }
}
