//! Collaborative Model - user-based k-nearest-neighbor rating predictor
//!
//! "Users who rate like you rated this movie like so."
//!
//! ## Algorithm
//! 1. Group the snapshot's ratings by user and by movie, and compute each
//!    user's mean rating
//! 2. For every pair of users sharing at least `min_support` rated movies,
//!    compute the cosine similarity of their ratings over those movies
//! 3. To predict (user, movie): take the `neighborhood_size` most similar
//!    other users who rated the movie and add their similarity-weighted
//!    average deviation from their own mean to the user's mean
//!
//! The model is fitted once; ratings written after the snapshot are
//! invisible until a new model is fitted.

use crate::error::{ModelError, Result};
use data_loader::{DataIndex, MAX_RATING, MIN_RATING, MovieId, UserId};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Neighborhood parameters for the collaborative model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnParams {
    /// Maximum number of neighbors used in one prediction
    pub neighborhood_size: usize,
    /// Minimum number of co-rated movies for two users to be comparable
    pub min_support: usize,
    /// Minimum number of usable neighbors for a prediction to succeed
    pub min_neighbors: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            neighborhood_size: 30,
            min_support: 5,
            min_neighbors: 1,
        }
    }
}

impl KnnParams {
    /// Configure the neighborhood size (default: 30)
    pub fn with_neighborhood_size(mut self, k: usize) -> Self {
        self.neighborhood_size = k;
        self
    }

    /// Configure the minimum co-rated movie count (default: 5)
    pub fn with_min_support(mut self, min: usize) -> Self {
        self.min_support = min;
        self
    }

    /// Configure the minimum neighbor count (default: 1)
    pub fn with_min_neighbors(mut self, min: usize) -> Self {
        self.min_neighbors = min;
        self
    }
}

/// Running sums for the cosine similarity of two users over co-rated movies.
#[derive(Debug, Default, Clone, Copy)]
struct CoRatings {
    dot: f64,
    sq_a: f64,
    sq_b: f64,
    support: usize,
}

impl CoRatings {
    fn add(&mut self, a: f32, b: f32) {
        let (a, b) = (a as f64, b as f64);
        self.dot += a * b;
        self.sq_a += a * a;
        self.sq_b += b * b;
        self.support += 1;
    }

    fn cosine(&self) -> f32 {
        let denom = (self.sq_a * self.sq_b).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            (self.dot / denom) as f32
        }
    }
}

/// One usable neighbor for a prediction
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    user_id: UserId,
    similarity: f32,
    rating: f32,
    mean: f32,
}

/// Fitted user-based KNN-with-means model
#[derive(Debug, Clone)]
pub struct CollaborativeModel {
    params: KnnParams,
    /// Ratings of each user: the model's own rating index
    user_ratings: HashMap<UserId, Vec<(MovieId, f32)>>,
    /// Raters of each movie
    movie_raters: HashMap<MovieId, Vec<(UserId, f32)>>,
    user_means: HashMap<UserId, f32>,
    /// Positive similarities only, stored for both users of a pair
    similarities: HashMap<UserId, HashMap<UserId, f32>>,
}

impl CollaborativeModel {
    /// Fit the model on a full rating snapshot
    #[instrument(skip_all, fields(k = params.neighborhood_size, min_support = params.min_support))]
    pub fn fit(snapshot: &DataIndex, params: KnnParams) -> Self {
        let mut user_ratings: HashMap<UserId, Vec<(MovieId, f32)>> = HashMap::new();
        let mut movie_raters: HashMap<MovieId, Vec<(UserId, f32)>> = HashMap::new();

        for rating in snapshot.ratings() {
            user_ratings
                .entry(rating.user_id)
                .or_default()
                .push((rating.movie_id, rating.rating));
            movie_raters
                .entry(rating.movie_id)
                .or_default()
                .push((rating.user_id, rating.rating));
        }

        let user_means = user_ratings
            .iter()
            .map(|(&user_id, ratings)| {
                let total: f32 = ratings.iter().map(|&(_, r)| r).sum();
                (user_id, total / ratings.len() as f32)
            })
            .collect();

        let similarities = compute_similarities(&user_ratings, &movie_raters, params.min_support);
        let pairs: usize = similarities.values().map(HashMap::len).sum::<usize>() / 2;

        info!(
            "Collaborative model fitted: {} users, {} movies, {} similar user pairs",
            user_ratings.len(),
            movie_raters.len(),
            pairs
        );

        Self {
            params,
            user_ratings,
            movie_raters,
            user_means,
            similarities,
        }
    }

    /// Whether the user has ratings in the training snapshot
    pub fn is_known_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// The user's (movie, rating) pairs as seen at training time
    pub fn rated_movies(&self, user_id: UserId) -> Option<&[(MovieId, f32)]> {
        self.user_ratings.get(&user_id).map(Vec::as_slice)
    }

    pub fn user_mean(&self, user_id: UserId) -> Option<f32> {
        self.user_means.get(&user_id).copied()
    }

    /// Cosine similarity of two users, 0.0 when they are not comparable
    pub fn user_similarity(&self, a: UserId, b: UserId) -> f32 {
        self.similarities
            .get(&a)
            .and_then(|sims| sims.get(&b))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn user_count(&self) -> usize {
        self.user_ratings.len()
    }

    /// Predict the rating `user_id` would give `movie_id`, on the 0.5 - 5.0 scale
    ///
    /// ## Errors
    /// - `UnknownUser` if the user has no ratings in the snapshot
    /// - `PredictionFailure` if nobody rated the movie or no similar user did
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> Result<f32> {
        let mean = self
            .user_mean(user_id)
            .ok_or(ModelError::UnknownUser(user_id))?;

        let failure = |reason: &str| ModelError::PredictionFailure {
            user_id,
            movie_id,
            reason: reason.to_string(),
        };

        let raters = self
            .movie_raters
            .get(&movie_id)
            .ok_or_else(|| failure("movie has no ratings"))?;

        let neighbors = self.neighbors(user_id, raters);
        if neighbors.is_empty() || neighbors.len() < self.params.min_neighbors {
            return Err(failure("not enough similar users rated this movie"));
        }

        let (weighted, total_sim) = neighbors.iter().fold((0.0f32, 0.0f32), |(w, s), n| {
            (w + n.similarity * (n.rating - n.mean), s + n.similarity)
        });

        let estimate = mean + weighted / total_sim;
        debug!(
            user_id,
            movie_id,
            neighbors = neighbors.len(),
            estimate,
            "Collaborative prediction"
        );
        Ok(estimate.clamp(MIN_RATING, MAX_RATING))
    }

    /// Top `neighborhood_size` other raters by similarity (ties: lower user id)
    fn neighbors(&self, user_id: UserId, raters: &[(UserId, f32)]) -> Vec<Neighbor> {
        let Some(sims) = self.similarities.get(&user_id) else {
            return Vec::new();
        };

        let mut neighbors: Vec<Neighbor> = raters
            .iter()
            .filter(|&&(other, _)| other != user_id)
            .filter_map(|&(other, rating)| {
                let similarity = *sims.get(&other)?;
                let mean = *self.user_means.get(&other)?;
                Some(Neighbor {
                    user_id: other,
                    similarity,
                    rating,
                    mean,
                })
            })
            .collect();

        let by_similarity = |a: &Neighbor, b: &Neighbor| {
            b.similarity
                .total_cmp(&a.similarity)
                .then(a.user_id.cmp(&b.user_id))
        };

        let k = self.params.neighborhood_size;
        if neighbors.len() > k {
            neighbors.select_nth_unstable_by(k, by_similarity);
            neighbors.truncate(k);
        }
        // Rater order follows hash iteration; fix it so the float sums are reproducible
        neighbors.sort_unstable_by(by_similarity);
        neighbors
    }
}

/// Cosine similarity for every user pair with enough co-rated movies.
///
/// Each pair is visited from its lower user id only, then stored both ways.
fn compute_similarities(
    user_ratings: &HashMap<UserId, Vec<(MovieId, f32)>>,
    movie_raters: &HashMap<MovieId, Vec<(UserId, f32)>>,
    min_support: usize,
) -> HashMap<UserId, HashMap<UserId, f32>> {
    let mut similarities: HashMap<UserId, HashMap<UserId, f32>> = HashMap::new();

    for (&user_id, ratings) in user_ratings {
        let mut co_ratings: HashMap<UserId, CoRatings> = HashMap::new();

        for &(movie_id, rating) in ratings {
            let Some(raters) = movie_raters.get(&movie_id) else {
                continue;
            };
            for &(other, other_rating) in raters {
                if other > user_id {
                    co_ratings.entry(other).or_default().add(rating, other_rating);
                }
            }
        }

        for (other, co) in co_ratings {
            if co.support < min_support {
                continue;
            }
            let sim = co.cosine();
            if sim > 0.0 {
                similarities.entry(user_id).or_default().insert(other, sim);
                similarities.entry(other).or_default().insert(user_id, sim);
            }
        }
    }

    similarities
}
