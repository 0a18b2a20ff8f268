//! Error types surfaced by the recommender.
//!
//! Only identity and infrastructure failures reach callers. Per-item scoring
//! failures never do: they are absorbed into neutral scores while ranking.

use data_loader::{DataLoadError, MovieId};
use models::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// Movie is not part of the catalog the active model was built from
    #[error("Movie {0} not found")]
    UnknownItem(MovieId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Another rebuild holds the rebuild lock
    #[error("A model rebuild is already in progress")]
    RebuildInProgress,

    #[error("Data error: {0}")]
    Data(#[from] DataLoadError),

    #[error("Candidate filtering failed: {0}")]
    Filter(#[source] anyhow::Error),

    #[error("Background rebuild task failed: {0}")]
    Background(#[from] tokio::task::JoinError),

    /// Model failure that has no better-suited variant
    #[error("Model error: {0}")]
    Model(ModelError),
}

impl From<ModelError> for RecommendError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownItem(movie_id) => RecommendError::UnknownItem(movie_id),
            ModelError::Store(source) => RecommendError::Data(source),
            other => RecommendError::Model(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
