use thiserror::Error;

/// Errors from repository operations (used by trait definitions in hookflow-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(String),
}
