//! Error types for the data-loader crate.
//!
//! Everything that can go wrong while reading a MovieLens dataset or
//! talking to a rating store is reported through [`DataLoadError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Directory holds neither movies.csv/ratings.csv nor movies.dat/ratings.dat
    #[error("No MovieLens dataset found in {path} (expected movies.csv/ratings.csv or movies.dat/ratings.dat)")]
    DatasetNotFound { path: String },

    #[error("I/O error reading dataset: {0}")]
    IoError(#[from] std::io::Error),

    /// A line of a data file could not be parsed; `line` is 1-based
    #[error("{file}:{line}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid {field} value '{value}'")]
    InvalidValue { field: String, value: String },

    /// A rating points at a movie outside the catalog
    #[error("Rating references unknown {entity} {id}")]
    MissingReference { entity: String, id: u32 },
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
