//! Error types for model lookups.

use data_loader::{DataLoadError, MovieId, UserId};
use thiserror::Error;

/// Errors raised by the collaborative model and the content index
#[derive(Error, Debug)]
pub enum ModelError {
    /// User has no ratings in the snapshot the model was trained on
    #[error("User {0} is unknown to the trained model")]
    UnknownUser(UserId),

    /// Movie is not part of the catalog the index was built from
    #[error("Movie {0} not found")]
    UnknownItem(MovieId),

    /// Neighborhood prediction could not produce an estimate
    #[error("Cannot predict rating of movie {movie_id} for user {user_id}: {reason}")]
    PredictionFailure {
        user_id: UserId,
        movie_id: MovieId,
        reason: String,
    },

    /// The rating store could not be read
    #[error("Rating store error: {0}")]
    Store(#[from] DataLoadError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
