//! Error types for zrag.

use thiserror::Error;

/// Errors raised when an input item or parameter is missing or malformed.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("field '{field}' not found or empty (item {item_index})")]
    MissingField { field: String, item_index: usize },

    #[error("field '{field}' is invalid (item {item_index}): {reason}")]
    InvalidField {
        field: String,
        item_index: usize,
        reason: String,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Chunking parameters that would make splitting degenerate.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },

    #[error("min chunk size ({min_chunk_size}) must be smaller than chunk size ({chunk_size})")]
    MinChunkTooLarge {
        min_chunk_size: usize,
        chunk_size: usize,
    },
}

/// Errors related to chunking a document.
#[derive(Debug, Error, PartialEq)]
pub enum ChunkError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Errors related to the vector database REST API.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector database: {0}")]
    ConnectionError(String),

    #[error("vector database request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("vector database error (code {code}): {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid vector database response: {0}")]
    InvalidResponse(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while running a knowledge base or vector store operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("{0}")]
    Other(String),
}
