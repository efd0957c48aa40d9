//! Error types for Penny

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Record store unavailable: {0}")]
    DataAccess(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error came from reading financial records.
    ///
    /// These are the only errors the advisor lets reach its caller.
    pub fn is_data_access(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Pool(_) | Error::Encryption(_) | Error::DataAccess(_)
        )
    }

    /// Whether this error came from the text-generation provider
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Generation(_) | Error::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
