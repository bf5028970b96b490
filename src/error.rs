use thiserror::Error;

/// Failures of a single answer lookup. None of these are fatal; each one is
/// scoped to the overlay lifecycle of the trigger that produced it.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Please set your API key in the extension settings")]
    MissingCredential,

    #[error("{0}")]
    UpstreamError(String),

    #[error("Invalid response from API")]
    MalformedResponse,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

impl LookupError {
    /// Text shown in the overlay for this failure.
    pub fn overlay_text(&self) -> String {
        match self {
            LookupError::UpstreamError(msg) => format!("API Error: {}", msg),
            other => format!("Error: {}", other),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Refusing to store an empty value for '{0}'")]
    EmptyValue(String),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard access failed: {0}")]
    AccessFailed(String),

    #[error("No clipboard available")]
    Unavailable,
}
