//! Error types for a3s-filter

use thiserror::Error;

/// Errors that can occur while classifying and filtering traffic
#[derive(Debug, Error)]
pub enum FilterError {
    /// Positional record too short (or not an array) to resolve the schema
    #[error("Malformed record: length {len}, schema requires at least {required}")]
    MalformedRecord {
        len: usize,
        required: usize,
    },

    /// Object response does not carry the configured list field
    #[error("List field '{path}' not found in response")]
    MissingListField {
        path: String,
    },

    /// No rule snapshot could be obtained
    #[error("Rule configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    /// Payload does not match any accepted framing for its channel
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Positional schema table is inconsistent
    #[error("Schema v{version} is invalid: {reason}")]
    Schema {
        version: u32,
        reason: String,
    },

    /// Invalid configuration input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
