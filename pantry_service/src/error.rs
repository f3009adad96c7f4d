//! Error types for pantry_service

use thiserror::Error;

/// Unified error type for record store operations.
///
/// Every variant is fatal for the request that hit it; nothing here is retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or renaming the JSON document failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The JSON document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// PostgreSQL query, transaction or connection failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
    /// A blocking store call panicked or was cancelled
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// The selected backend is missing a required setting
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for record store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
