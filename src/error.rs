//! Error types for the Bazaar library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`EngineError`] enum. Most pipeline stages are infallible: filters treat
//! missing data as "does not satisfy", a malformed sort token falls back to the
//! configured default, and an empty page is a valid outcome. What remains are
//! cursor mismatches, bad arguments, configuration problems and failures
//! reported by the row-fetch collaborators.
//!
//! # Examples
//!
//! ```
//! use bazaar::error::{EngineError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(EngineError::invalid_argument("page size must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Bazaar operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The cursor references an `(id, type)` pair absent from the sequence.
    #[error("Cursor not found: no {record_type} with id {id} in the current sequence")]
    InvalidCursor { id: u64, record_type: String },

    /// A sort token that does not parse as `field_direction`.
    #[error("Malformed sort spec: {0}")]
    MalformedSortSpec(String),

    /// Invalid caller-supplied argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failures reported by a row-fetch collaborator.
    #[error("Source error: {0}")]
    Source(String),

    /// I/O errors (config and snapshot files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Create a new invalid cursor error.
    pub fn invalid_cursor<S: Into<String>>(id: u64, record_type: S) -> Self {
        EngineError::InvalidCursor {
            id,
            record_type: record_type.into(),
        }
    }

    /// Create a new malformed sort spec error.
    pub fn malformed_sort<S: Into<String>>(msg: S) -> Self {
        EngineError::MalformedSortSpec(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        EngineError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        EngineError::Config(msg.into())
    }

    /// Create a new collaborator fetch error.
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        EngineError::Source(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        EngineError::Other(msg.into())
    }

    /// Whether this error means "the thing the caller pointed at does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::InvalidCursor { .. })
    }
}
