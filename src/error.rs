use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid source url `{0}`")]
    InvalidSource(String),

    #[error("Cannot read config {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Csv error")]
    CsvError(#[from] csv::Error),

    #[error("Io error")]
    IoError(#[from] std::io::Error),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("Http client error")]
    HttpClient(#[from] reqwest::Error),
}

/// Transport-level failure of a single request. A non-200 status is not one
/// of these; the collector classifies statuses itself.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid url `{0}`")]
    InvalidUrl(String),

    #[error("Transport error")]
    Transport(#[from] reqwest::Error),
}
