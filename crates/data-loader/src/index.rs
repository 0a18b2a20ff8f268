//! DataIndex building and indexing logic.
//!
//! Turns parsed movies and ratings into a validated snapshot:
//! - primary indices (movies, ratings by user, ratings by movie)
//! - aggregate statistics per movie
//! - integrity checks against the rating scale and the catalog

use crate::error::{DataLoadError, Result};
use crate::parser::{self, DatasetFormat};
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

impl DataIndex {
    /// Load a MovieLens dataset from a directory
    ///
    /// Steps:
    /// 1. Detect the file layout (CSV or .dat)
    /// 2. Parse movies and ratings in parallel
    /// 3. Build the indices and movie statistics
    /// 4. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        let format = DatasetFormat::detect(data_dir)?;
        info!("Loading MovieLens dataset from {:?} ({:?})", data_dir, format);

        let (movies_path, ratings_path) = format.paths(data_dir);

        // Rayon's `join` runs both parsers in parallel
        let (movies, ratings) = rayon::join(
            || parser::parse_movies(&movies_path, format),
            || parser::parse_ratings(&ratings_path, format),
        );
        let movies = movies?;
        let ratings = ratings?;

        info!("Parsed {} movies, {} ratings", movies.len(), ratings.len());

        let index = DataIndex::from_parts(movies, ratings);
        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(
            "DataIndex built and validated: {} users, {} movies, {} ratings",
            users, movies, ratings
        );
        Ok(index)
    }

    /// Build an index from whole tables.
    ///
    /// Duplicate (user, movie) ratings collapse to the last one in input order,
    /// matching the store's upsert semantics.
    pub fn from_parts(movies: Vec<Movie>, ratings: Vec<Rating>) -> Self {
        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }

        let mut latest: HashMap<(UserId, MovieId), usize> = HashMap::with_capacity(ratings.len());
        for (pos, rating) in ratings.iter().enumerate() {
            latest.insert((rating.user_id, rating.movie_id), pos);
        }

        for (pos, rating) in ratings.into_iter().enumerate() {
            if latest.get(&(rating.user_id, rating.movie_id)) != Some(&pos) {
                continue;
            }
            index.user_ratings.entry(rating.user_id).or_default().push(rating);
            index.movie_ratings.entry(rating.movie_id).or_default().push(rating);
        }

        index.compute_movie_stats();
        index
    }

    /// Compute aggregate statistics for all movies
    ///
    /// For each movie: average rating, rating count and a popularity score
    /// of `avg_rating * ln(rating_count + 1)`.
    pub fn compute_movie_stats(&mut self) {
        self.movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(&movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };

                (
                    movie_id,
                    MovieStats {
                        avg_rating,
                        rating_count,
                        popularity_score: compute_popularity_score(avg_rating, rating_count),
                    },
                )
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Every rating must reference a movie in the catalog and lie on the
    /// 0.5 - 5.0 scale.
    pub fn validate(&self) -> Result<()> {
        for rating in self.ratings() {
            if !self.movies.contains_key(&rating.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                });
            }
            if !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Rewards both high ratings and many ratings
fn compute_popularity_score(avg_rating: f32, rating_count: u32) -> f32 {
    avg_rating * (rating_count as f32 + 1.0).ln()
}
