use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvatsError {
    /// Caller-side input problem, detected before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status or unreadable body from an endpoint.
    #[error("Transport error: {0}")]
    Transport(String),

    /// `ok: false` reported by the backend.
    #[error("{0}")]
    Server(String),

    #[error("Text extraction is still running. Try again.")]
    ExtractionTimeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CvatsError {
    /// Whether repeating the whole operation may succeed without changing the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CvatsError::ExtractionTimeout)
    }
}

pub type Result<T> = std::result::Result<T, CvatsError>;
