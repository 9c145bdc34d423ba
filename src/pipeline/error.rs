//! Page fetch errors
//!
//! Every failure is recoverable: the fetcher records it as a diagnostic and
//! keeps whatever it has accumulated.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure
    Network(String),
    /// Non-2xx response
    Status { status: u16, body: String },
    /// Response body was not valid JSON
    MalformedBody(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Transport(TransportError),
    /// Response was JSON but not the expected shape
    Schema(String),
}

impl FetchError {
    /// Network errors, 429 and 5xx are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(TransportError::Network(_)) => true,
            FetchError::Transport(TransportError::Status { status, .. }) => {
                *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        FetchError::Transport(err)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.into())
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(e) => write!(f, "network error: {}", e),
            TransportError::Status { status, body } => {
                write!(f, "HTTP {}: {}", status, body)
            }
            TransportError::MalformedBody(e) => write!(f, "malformed response body: {}", e),
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "Transport error: {}", e),
            FetchError::Schema(e) => write!(f, "Schema error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl std::error::Error for FetchError {}
