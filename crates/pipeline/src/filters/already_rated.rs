//! Filter to remove movies the user has already rated.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::MovieId;
use models::UserContext;

/// Removes candidates present in the user's rated set.
///
/// Uses `UserContext::rated_movies` for O(1) lookups, so the rating store is
/// never consulted per candidate.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(&self, candidates: Vec<MovieId>, context: &UserContext) -> Result<Vec<MovieId>> {
        Ok(candidates
            .into_iter()
            .filter(|movie_id| !context.has_rated(*movie_id))
            .collect())
    }
}
