//! Access to the durable rating store and item catalog.
//!
//! Models never hold a connection to the store: they are trained from one
//! [`DataIndex`] snapshot. The only per-request read is
//! [`RatingStore::user_ratings`], used for users who started rating after the
//! snapshot was taken.

use crate::error::Result;
use crate::parser::{self, DatasetFormat};
use crate::types::*;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of the rating store and item catalog.
pub trait RatingStore: Send + Sync {
    /// Materialize every movie and every rating as one snapshot.
    fn load_snapshot(&self) -> Result<DataIndex>;

    /// Current ratings of one user, straight from the store.
    fn user_ratings(&self, user_id: UserId) -> Result<Vec<Rating>>;
}

/// Rating store backed by a MovieLens dataset directory.
///
/// Files are re-read on every call, so edits on disk are picked up by the
/// next snapshot or lookup. That includes [`RatingStore::user_ratings`]: each
/// call parses the whole ratings file, so every request for a user missing
/// from the trained model costs a full file scan until the next rebuild.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    data_dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl RatingStore for DirectoryStore {
    fn load_snapshot(&self) -> Result<DataIndex> {
        DataIndex::load_from_files(&self.data_dir)
    }

    fn user_ratings(&self, user_id: UserId) -> Result<Vec<Rating>> {
        let format = DatasetFormat::detect(&self.data_dir)?;
        let (_, ratings_path) = format.paths(&self.data_dir);

        let ratings: Vec<Rating> = parser::parse_ratings(&ratings_path, format)?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();

        debug!("Read {} ratings for user {} from {:?}", ratings.len(), user_id, ratings_path);
        Ok(ratings)
    }
}

/// In-process rating store.
///
/// Accepts writes at any time; readers get copies, so a snapshot taken for
/// model training never changes underneath the model.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<DataIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_movie(&self, movie: Movie) {
        self.data.write().insert_movie(movie);
    }

    /// Insert or replace the rating for (user, movie).
    pub fn upsert_rating(&self, rating: Rating) {
        self.data.write().insert_rating(rating);
    }
}

impl RatingStore for MemoryStore {
    fn load_snapshot(&self) -> Result<DataIndex> {
        let mut snapshot = self.data.read().clone();
        snapshot.compute_movie_stats();
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn user_ratings(&self, user_id: UserId) -> Result<Vec<Rating>> {
        Ok(self.data.read().get_user_ratings(user_id).to_vec())
    }
}
