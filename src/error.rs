use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The venue answered `success=0`; the message is passed through verbatim.
    #[error("{0}")]
    Remote(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Data parsing error: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Remote(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("timeout: {}", err))
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
