//! Per-request view of what a user has already rated.
//!
//! A `UserContext` is built once per request and handed to every scoring
//! step, so neither the model nor the store is queried per candidate.

use crate::collaborative::CollaborativeModel;
use crate::error::Result;
use data_loader::{MovieId, RatingStore, UserId};
use std::collections::HashSet;
use tracing::debug;

/// Where a user's ratings were found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSource {
    /// The collaborative model's training snapshot
    Model,
    /// The rating store, for users who started rating after the snapshot
    Store,
    /// Nowhere: a pure cold-start user
    Empty,
}

/// Ratings of one user, with O(1) membership checks
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: UserId,
    pub ratings: Vec<(MovieId, f32)>,
    pub rated_movies: HashSet<MovieId>,
    pub source: RatingSource,
}

impl UserContext {
    pub fn new(user_id: UserId, ratings: Vec<(MovieId, f32)>, source: RatingSource) -> Self {
        let rated_movies = ratings.iter().map(|&(movie_id, _)| movie_id).collect();
        Self {
            user_id,
            ratings,
            rated_movies,
            source,
        }
    }

    /// Context of a user with no ratings anywhere
    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, Vec::new(), RatingSource::Empty)
    }

    pub fn has_rated(&self, movie_id: MovieId) -> bool {
        self.rated_movies.contains(&movie_id)
    }

    pub fn is_cold_start(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// Resolve a user's ratings.
///
/// Users known to the model use its rating index; anyone else is looked up in
/// the store, and ends up with an empty context if the store has nothing.
pub fn build_user_context(
    model: &CollaborativeModel,
    store: &dyn RatingStore,
    user_id: UserId,
) -> Result<UserContext> {
    if let Some(rated) = model.rated_movies(user_id) {
        return Ok(UserContext::new(user_id, rated.to_vec(), RatingSource::Model));
    }

    let ratings: Vec<(MovieId, f32)> = store
        .user_ratings(user_id)?
        .into_iter()
        .map(|r| (r.movie_id, r.rating))
        .collect();

    if ratings.is_empty() {
        debug!("User {} has no ratings, treating as cold start", user_id);
        return Ok(UserContext::empty(user_id));
    }

    debug!(
        "User {} unknown to the model, found {} ratings in the store",
        user_id,
        ratings.len()
    );
    Ok(UserContext::new(user_id, ratings, RatingSource::Store))
}
