use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid month '{0}' (expected 1-12 or a month name)")]
    InvalidMonth(String),
    #[error("Unknown territory manager: {0}")]
    UnknownTerritoryManager(String),
    #[error("No data available to export")]
    NoExportData,
}

pub type Result<T> = std::result::Result<T, ReportError>;
