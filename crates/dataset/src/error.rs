// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while describing datasets and planning their layout
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A descriptor or strategy was configured incompletely or inconsistently
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown format '{name}' (known formats: {})", .known.join(", "))]
    UnknownFormat { name: String, known: Vec<&'static str> },

    /// An accessor was called whose precondition does not hold
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A storage path has a different number of partition components
    /// than the partition strategy has fields
    #[error("Layout mismatch at '{path}': expected {expected} partition components, found {found}")]
    LayoutMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    /// A path component names a different partition than the strategy
    /// expects at that depth
    #[error("Layout mismatch: expected partition '{expected}', found segment '{segment}'")]
    SegmentMismatch { expected: String, segment: String },

    /// A value could not be mapped to (or parsed from) a partition key
    #[error("Invalid partition key for '{field}': {message}")]
    InvalidKey { field: String, message: String },

    /// Schema text or a data file header could not be interpreted
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Type tracing error: {0}")]
    Tracing(#[from] serde_arrow::Error),

    #[error("Invalid URI: {0}")]
    Url(#[from] url::ParseError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

impl Error {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Error::Configuration(message.into())
    }

    pub fn illegal_state<S: Into<String>>(message: S) -> Self {
        Error::IllegalState(message.into())
    }

    pub fn invalid_key<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Error::InvalidKey {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Configuration errors are raised at build time for missing or
    /// unrecognized settings
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::UnknownFormat { .. })
    }

    /// Layout errors signal drift between stored paths and the strategy
    #[must_use]
    pub fn is_layout_mismatch(&self) -> bool {
        matches!(
            self,
            Error::LayoutMismatch { .. } | Error::SegmentMismatch { .. }
        )
    }

    #[must_use]
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Error::IllegalState(_))
    }
}
