use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaystackApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request to Paystack timed out: {0}")]
    Timeout(String),
    #[error("Could not reach Paystack: {0}")]
    Transport(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Paystack rejected the request: {0}")]
    Rejected(String),
    #[error("Paystack returned an empty data payload")]
    EmptyResponse,
}

impl PaystackApiError {
    /// Transient errors may succeed if the call is repeated later. Everything else is a definitive answer from the
    /// gateway.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PaystackApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
