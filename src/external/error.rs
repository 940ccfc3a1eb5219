//! Error type shared by the outbound HTTP clients and the platform resolvers.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a call to an external platform API.
///
/// Variants are ordered from the transport outwards. Each resolver operation
/// wraps the innermost cause in `Context`, so the display form reads
/// `failed to get room: unexpected response code: 60004, message: ...`.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Connection, DNS, TLS or body read failure
    #[error("request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// Response with a status of 400 or above
    #[error("request failed: status code: {status}")]
    HttpStatus { status: StatusCode },

    /// Payload was not JSON, usually an HTML block or error page
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// Body could not be decoded into the expected envelope
    #[error("failed to decode response body: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// Envelope decoded fine but carried a non-zero code
    #[error("unexpected response code: {code}, message: {message}")]
    Api { code: i64, message: String },

    /// A URL field in the payload did not parse
    #[error("failed to parse url '{url}': {source}")]
    UrlParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Operation tag wrapped around a lower level failure
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<PlatformError>,
    },
}

impl PlatformError {
    /// Innermost error below any `Context` wrappers.
    pub fn root(&self) -> &PlatformError {
        match self {
            PlatformError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Adds an operation tag to a failed platform call.
pub trait PlatformResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, PlatformError>;
}

impl<T> PlatformResultExt<T> for Result<T, PlatformError> {
    fn context(self, context: &'static str) -> Result<T, PlatformError> {
        self.map_err(|source| PlatformError::Context {
            context,
            source: Box::new(source),
        })
    }
}
