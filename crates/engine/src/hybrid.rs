//! # Hybrid Recommender
//!
//! Blends two signals for every candidate movie of a user:
//! - collaborative: the KNN model's predicted rating, or 3.0 when it has none
//! - content: genre similarity to what the user rated, weighted by those
//!   ratings and scaled to the 0 - 5 rating range
//!
//! `hybrid = collaborative_weight * collaborative + content_weight * content`
//!
//! ## Request flow
//! 1. Resolve the user's ratings once into a `UserContext`
//! 2. Candidates = catalog (ascending id) minus rated movies, capped
//! 3. Score candidates in parallel
//! 4. Rank by hybrid score, ties by ascending movie id, keep the top n
//! 5. Round scores to 2 decimals
//!
//! A built recommender is immutable. New ratings become visible only by
//! building a fresh instance, see `RecommenderHandle`.

use crate::config::{EngineConfig, NEUTRAL_SCORE};
use crate::error::{RecommendError, Result};
use data_loader::{DataIndex, MAX_RATING, Movie, MovieId, RatingStore, UserId};
use models::{CollaborativeModel, ContentIndex, UserContext, build_user_context};
use pipeline::{FilterPipeline, candidate_pipeline};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, trace};

/// One ranked recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub movie_id: MovieId,
    pub hybrid_score: f32,
    pub collaborative_score: f32,
    pub content_score: f32,
}

impl ScoredCandidate {
    fn rounded(self) -> Self {
        Self {
            movie_id: self.movie_id,
            hybrid_score: round2(self.hybrid_score),
            collaborative_score: round2(self.collaborative_score),
            content_score: round2(self.content_score),
        }
    }
}

/// Score decomposition of a single (user, movie) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub movie_id: MovieId,
    pub title: String,
    /// Genre tags joined with `|`
    pub genres: String,
    pub hybrid_score: f32,
    pub collaborative_score: f32,
    pub content_score: f32,
    pub collaborative_weight: f32,
    pub content_weight: f32,
}

/// Presentation rounding to 2 decimal digits
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

pub struct HybridRecommender {
    config: EngineConfig,
    store: Arc<dyn RatingStore>,
    snapshot: DataIndex,
    /// Catalog movie ids, ascending
    catalog: Vec<MovieId>,
    collaborative: CollaborativeModel,
    content: ContentIndex,
    filters: FilterPipeline,
}

impl HybridRecommender {
    /// Load a snapshot from the store and train both models on it.
    ///
    /// Blocks until both models are built. The store stays attached for
    /// looking up users who appear after the snapshot was taken.
    pub fn build(store: Arc<dyn RatingStore>, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let start = Instant::now();
        let snapshot = store.load_snapshot()?;
        info!("Loaded training snapshot in {:.2?}", start.elapsed());

        Self::from_snapshot(store, snapshot, config)
    }

    /// Train both models on an already loaded snapshot
    pub fn from_snapshot(
        store: Arc<dyn RatingStore>,
        snapshot: DataIndex,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let start = Instant::now();
        let collaborative = CollaborativeModel::fit(&snapshot, config.knn_params());
        info!("Collaborative model ready in {:.2?}", start.elapsed());

        let start = Instant::now();
        let content = ContentIndex::build(&snapshot);
        info!("Content index ready in {:.2?}", start.elapsed());

        let catalog = snapshot.movie_ids();
        let filters = candidate_pipeline(config.candidate_cap);

        Ok(Self {
            config,
            store,
            snapshot,
            catalog,
            collaborative,
            content,
            filters,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The data the models were trained on
    pub fn snapshot(&self) -> &DataIndex {
        &self.snapshot
    }

    pub fn collaborative(&self) -> &CollaborativeModel {
        &self.collaborative
    }

    pub fn content(&self) -> &ContentIndex {
        &self.content
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&Movie> {
        self.snapshot.get_movie(movie_id)
    }

    pub fn catalog_size(&self) -> usize {
        self.catalog.len()
    }

    /// Ratings of `user_id`: from the model if it knows the user, else the store
    pub fn user_context(&self, user_id: UserId) -> Result<UserContext> {
        Ok(build_user_context(
            &self.collaborative,
            self.store.as_ref(),
            user_id,
        )?)
    }

    /// Top `n` unrated movies for `user_id`, best first.
    ///
    /// Unknown users are not an error: they get content-only or, with no
    /// ratings at all, uniform neutral scores.
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: UserId, n: usize) -> Result<Vec<ScoredCandidate>> {
        let start = Instant::now();
        let context = self.user_context(user_id)?;

        let candidates = self
            .filters
            .apply(self.catalog.clone(), &context)
            .map_err(RecommendError::Filter)?;

        if candidates.is_empty() {
            debug!("No candidates left for user {}", user_id);
            return Ok(Vec::new());
        }

        let mut scored: Vec<ScoredCandidate> = candidates
            .par_iter()
            .map(|&movie_id| self.score(&context, movie_id))
            .collect();

        scored.sort_unstable_by(|a, b| {
            b.hybrid_score
                .total_cmp(&a.hybrid_score)
                .then(a.movie_id.cmp(&b.movie_id))
        });
        scored.truncate(n);

        debug!(
            "Ranked {} candidates for user {} ({:?} ratings) in {:.2?}",
            candidates.len(),
            user_id,
            context.source,
            start.elapsed()
        );

        Ok(scored.into_iter().map(ScoredCandidate::rounded).collect())
    }

    /// `recommend` with the configured default result count
    pub fn recommend_default(&self, user_id: UserId) -> Result<Vec<ScoredCandidate>> {
        self.recommend(user_id, self.config.default_result_count)
    }

    /// Score decomposition for one movie.
    ///
    /// Works for any catalog movie, including ones the user already rated.
    #[instrument(skip(self))]
    pub fn explain(&self, user_id: UserId, movie_id: MovieId) -> Result<Explanation> {
        let movie = self
            .movie(movie_id)
            .ok_or(RecommendError::UnknownItem(movie_id))?;
        let context = self.user_context(user_id)?;
        let scored = self.score(&context, movie_id).rounded();

        Ok(Explanation {
            movie_id,
            title: movie.title.clone(),
            genres: movie.genres_string(),
            hybrid_score: scored.hybrid_score,
            collaborative_score: scored.collaborative_score,
            content_score: scored.content_score,
            collaborative_weight: self.config.collaborative_weight,
            content_weight: self.config.content_weight,
        })
    }

    /// Up to `n` movies with the most similar genres, most similar first
    pub fn similar_items(&self, movie_id: MovieId, n: usize) -> Result<Vec<(MovieId, f32)>> {
        Ok(self.content.nearest_items(movie_id, n)?)
    }

    fn score(&self, context: &UserContext, movie_id: MovieId) -> ScoredCandidate {
        let collaborative_score = self.collaborative_score(context.user_id, movie_id);
        let content_score = self.content_score(context, movie_id);
        let hybrid_score = self.config.collaborative_weight * collaborative_score
            + self.config.content_weight * content_score;

        ScoredCandidate {
            movie_id,
            hybrid_score,
            collaborative_score,
            content_score,
        }
    }

    fn collaborative_score(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        match self.collaborative.predict(user_id, movie_id) {
            Ok(estimate) => estimate,
            Err(err) => {
                trace!("Neutral collaborative score: {}", err);
                NEUTRAL_SCORE
            }
        }
    }

    fn content_score(&self, context: &UserContext, movie_id: MovieId) -> f32 {
        match self.content.weighted_similarity(movie_id, &context.ratings) {
            Ok(similarity) => similarity * MAX_RATING,
            Err(err) => {
                trace!("No content score for movie {}: {}", movie_id, err);
                0.0
            }
        }
    }
}
