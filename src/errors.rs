use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Query service error: {0}")]
    Query(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Timestamp parse error for '{raw}': {source}")]
    Timestamp {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
}
