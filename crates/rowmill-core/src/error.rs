use thiserror::Error;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("shape error: {0}")]
    Shape(String),

    #[error("matcher error: {0}")]
    Matcher(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serde(e.to_string())
    }
}
