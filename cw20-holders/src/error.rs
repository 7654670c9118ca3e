//! Error type shared by every operation of the SDK.

/// Errors produced while talking to a Cosmos REST (LCD) endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success HTTP status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not the JSON shape we expected.
    #[error("invalid response from {url}: {source}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// The JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured REST endpoint cannot carry path segments.
    #[error("invalid REST endpoint {0}")]
    Endpoint(String),

    /// A smart query could not be serialized to JSON.
    #[error("failed to encode smart query: {0}")]
    Query(#[source] serde_json::Error),

    /// A bank balance amount was not a non-negative integer.
    #[error("invalid amount {amount:?} for denom {denom}")]
    Amount {
        /// The denom whose amount failed to parse.
        denom: String,
        /// The raw amount string returned by the node.
        amount: String,
    },
}

/// Convenience alias used throughout the SDK.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the HTTP status code when the node rejected the request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
