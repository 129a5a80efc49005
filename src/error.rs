//! Error types for pagelink.

use thiserror::Error;

/// Result type for pagelink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pagelink operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// PageXML document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A line reference did not resolve in the line index.
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Appending a ledger row would violate the `(source, tag, text)` key.
    ///
    /// Fatal: a duplicate key means upstream extraction or merging produced
    /// the same mention twice.
    #[error("Duplicate ledger key: {0}")]
    DuplicateLedgerKey(String),

    /// Knowledge-base lookup failed (network, empty result, bad response).
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML reader error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a line-not-found error.
    pub fn line_not_found(msg: impl Into<String>) -> Self {
        Error::LineNotFound(msg.into())
    }

    /// Create a lookup error.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Error::Lookup(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
