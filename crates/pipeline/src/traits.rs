//! Core traits for the filtering pipeline.

use anyhow::Result;
use data_loader::MovieId;
use models::UserContext;

/// Narrows a set of candidate movies for one user.
///
/// Filters take ownership of the candidate list and return what is left;
/// they must keep the relative order of the candidates they retain.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    fn apply(&self, candidates: Vec<MovieId>, context: &UserContext) -> Result<Vec<MovieId>>;
}
