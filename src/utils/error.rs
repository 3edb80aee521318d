// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Could not read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcomes of the extraction core. None of these are fatal: callers turn them
/// into user-facing messages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("No tables found in document")]
    NoTablesFound,

    #[error("No grade detected in table {0}")]
    NoGradeDetected(usize),

    #[error("Nothing to export")]
    NothingToExport,

    #[error("CSV writing failed: {0}")]
    CsvWrite(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    MalformedConfiguration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Loading document failed: {0}")]
    Source(#[from] SourceError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
