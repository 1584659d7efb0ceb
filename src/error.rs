use thiserror::Error;

/// Problems detected before any file is processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found. Set it in the environment or in a .env file")]
    MissingCredential(&'static str),

    #[error("column {column:?} in {file} declares both a release type and a management type")]
    ConflictingTarget { file: String, column: String },

    #[error("unknown TRI file: {0} (expected one of 1a, 1b, 3a, 3c)")]
    UnknownFile(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A single enrichment request that did not produce a value
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// Row-level problems that abort the transform of a whole file
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unknown unit: {0:?}")]
    UnknownUnit(String),

    #[error("non-numeric quantity {value:?} in column {column:?}")]
    InvalidQuantity { column: String, value: String },

    #[error("column {0:?} not found in file header")]
    MissingColumn(String),
}
