use thiserror::Error;

#[derive(Debug, Error)]
pub enum Oid2NameError {
    #[error("database connection failed: {0}")]
    Connect(#[source] postgres::Error),
    #[error("query failed: {0}")]
    Query(#[source] postgres::Error),
    #[error("failed to read cache file {path}: {source}")]
    CacheRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write cache file {path}: {source}")]
    CacheWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cache file: {0}")]
    CacheFormat(#[from] serde_json::Error),
}
