use garden_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GardenError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
