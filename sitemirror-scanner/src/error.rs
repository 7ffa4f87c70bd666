use std::path::PathBuf;
use thiserror::Error;

/// A page could not be retrieved. Only the affected branch is abandoned.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Bad status code {status} getting web page from url {url}")]
    Status { url: String, status: u16 },

    #[error("Fetch cancelled")]
    Cancelled,
}

/// A fetched page could not be written. Logged and skipped.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not move {from} into place at {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal problems detected before any crawling starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Please enter a URL to crawl")]
    MissingSeed,

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("Could not create destination directory {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

/// Coarse error classification carried on crawl results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Fetch,
    Persist,
    Cancelled,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Fetch,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
