use thiserror::Error;

/// Failure while reading visit history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed visit record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("History unavailable: {0}")]
    Unavailable(String),
}

/// Failure while loading or persisting learned preferences.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Preferences I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preferences (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Preferences store unavailable: {0}")]
    Unavailable(String),
}
