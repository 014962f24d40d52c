use thiserror::Error;

/// Errors from the remote clients (topic feed and Bangumi).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error at {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("feed error: {0}")]
    Feed(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
