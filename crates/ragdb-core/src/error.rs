use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Index not ready: {0}")]
    IndexNotReady(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding provider timed out after {0} ms")]
    ProviderTimeout(u64),

    #[error("Embedding provider rejected credentials: {0}")]
    ProviderAuth(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
