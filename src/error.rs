use thiserror::Error;

/// Errors raised at the I/O boundary. The aggregation pipeline itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unknown view: {0}")]
    UnknownView(String),
}

pub type Result<T> = std::result::Result<T, Error>;
