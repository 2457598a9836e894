//! Error types for dataset reading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading the input dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be opened.
    #[error("cannot open dataset {path}: {source}")]
    Open {
        /// Dataset path.
        path: PathBuf,
        /// Underlying CSV/IO error.
        #[source]
        source: csv::Error,
    },

    /// A row or the header could not be decoded.
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        /// Dataset path.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The requested reference column is not in the header row.
    #[error("column '{column}' not found in {path}\n  Suggestion: pass --column with one of: {available}")]
    MissingColumn {
        /// Dataset path.
        path: PathBuf,
        /// Column that was requested.
        column: String,
        /// Comma-separated header names that do exist.
        available: String,
    },
}

impl DatasetError {
    /// Creates an open error.
    pub fn open(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Creates a decoding error.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
