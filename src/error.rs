use log::SetLoggerError;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

// Errors raised by the application layer (settings, logging, front-end IO).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] SetLoggerError),
}

// Failures of a single remote coaching call. These never reach the user; the
// coach swaps them for a fallback reply and only the connectivity status moves.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("API key not configured")]
    Unauthenticated,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {status}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),
}

// Messages never carry the request URL.
impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            CallError::MalformedResponse(err.to_string())
        } else {
            CallError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        CallError::MalformedResponse(err.to_string())
    }
}
