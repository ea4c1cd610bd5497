use http::StatusCode;
use thiserror::Error;

/// Result type alias for tracking service operations
pub type Result<T, E = TrackingError> = std::result::Result<T, E>;

/// Errors that stop the tracking service itself. Per-shipment failures never
/// end up here, they are folded into the batch response instead.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),
}

/// Batch-level input problems, rejected before any lookup is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("authToken required")]
    MissingAuthToken,

    #[error("at least one order id required")]
    MissingOrderIds,
}

/// Failure of a single call to the upstream tracking provider.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("upstream timed out")]
    Timeout,

    #[error("upstream connection failed: {0}")]
    Connection(String),

    #[error("upstream rate limited the request")]
    TooManyRequests,

    #[error("upstream rejected the request with status {0}")]
    Rejected(StatusCode),

    #[error("upstream returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("could not build upstream request: {0}")]
    Request(String),
}

impl UpstreamError {
    /// Network-level failures and rate limiting are worth another attempt.
    /// Anything the upstream actively refused is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::Timeout | UpstreamError::Connection(_) | UpstreamError::TooManyRequests
        )
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_connect() || e.is_request() || e.is_body() {
            UpstreamError::Connection(e.to_string())
        } else if e.is_decode() {
            UpstreamError::MalformedBody(e.to_string())
        } else if e.is_builder() {
            UpstreamError::Request(e.to_string())
        } else {
            UpstreamError::Connection(e.to_string())
        }
    }
}
