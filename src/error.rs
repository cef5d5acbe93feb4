use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaasError {
    #[error("Source dataset not found: {0}")]
    SourceMissing(String),

    #[error("Schema collision: {0}")]
    SchemaCollision(String),

    #[error("Ingestion verification failed: {0}")]
    VerificationFailed(String),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for DaasError {
    fn from(err: polars::error::PolarsError) -> Self {
        DaasError::Polars(err.to_string())
    }
}

impl DaasError {
    /// HTTP status this error maps to at the endpoint boundary.
    /// Caller input faults are 400, everything else is a server fault.
    pub fn http_status(&self) -> u16 {
        match self {
            DaasError::BadRequest(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, DaasError>;
