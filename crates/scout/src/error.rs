//! Error types for query compilation and execution.
//!
//! Errors are grouped by where they originate: record-type configuration,
//! builder input, the cluster transport, the shape of cluster responses and
//! the record store that backs result mapping.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for every scout operation.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// The record type is not set up for search.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Invalid builder input.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The cluster could not be reached or rejected the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The cluster answered with something we cannot read.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Backing records could not be loaded.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Errors raised when a record type cannot take part in a search.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// The record type declares no index, so it cannot be searched.
    #[error("the model {model} has no index set")]
    MissingIndex { model: String },
}

/// Errors raised while accumulating builder state.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A comparison operator outside `= != > >= < <=`.
    #[error("unknown where operator: {operator}")]
    UnknownOperator { operator: String },

    /// Pagination arguments that cannot produce a window.
    #[error("invalid pagination: {message}")]
    InvalidPagination { message: String },
}

/// Errors from the cluster transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport could not be built.
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The request never produced a response.
    #[error("request failed: {message}")]
    RequestFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The cluster answered with a non-success status.
    #[error("cluster returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Errors reading a cluster response.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// A required key is missing or has the wrong shape.
    #[error("malformed search response: {message}")]
    Malformed { message: String },
}

/// Errors from the record store behind a searchable type.
#[derive(Error, Debug)]
pub enum RecordError {
    /// Batch loading records by id failed.
    #[error("failed to fetch {model} records: {message}")]
    FetchFailed { model: String, message: String },
}

/// Result type alias for scout operations.
pub type ScoutResult<T> = Result<T, ScoutError>;

impl From<serde_json::Error> for ScoutError {
    fn from(err: serde_json::Error) -> Self {
        ScoutError::Response(ResponseError::Malformed {
            message: err.to_string(),
        })
    }
}
