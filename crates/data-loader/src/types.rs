//! Core domain types for the MovieLens dataset.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for domain clarity (UserId, MovieId)
//! - `Movie` and `Rating` records as they appear in the rating store
//! - `DataIndex`, the in-memory snapshot every model is trained from

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// Lowest rating the store accepts
pub const MIN_RATING: f32 = 0.5;

/// Highest rating the store accepts
pub const MAX_RATING: f32 = 5.0;

/// Separator used when genre tags are serialized into one string
pub const GENRE_SEPARATOR: char = '|';

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Ordered genre tags, e.g. `["Adventure", "Children", "Fantasy"]`
    pub genres: Vec<String>,
}

impl Movie {
    /// Build a movie from its stored form, deriving the year from the title.
    pub fn new(id: MovieId, title: impl Into<String>, genres: &str) -> Self {
        let title = title.into();
        Self {
            id,
            year: crate::parser::extract_year_from_title(&title),
            title,
            genres: crate::parser::parse_genres(genres),
        }
    }

    /// Genres joined back into the delimiter-separated stored form.
    pub fn genres_string(&self) -> String {
        self.genres.join(&GENRE_SEPARATOR.to_string())
    }
}

// =============================================================================
// Rating Type
// =============================================================================

/// Represents a single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0
    pub rating: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed statistics for a movie
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
    /// Popularity score derived from rating count and average
    pub popularity_score: f32,
}

// =============================================================================
// DataIndex - The In-Memory Snapshot
// =============================================================================

/// Full snapshot of the rating store: every movie and every rating.
///
/// Models are trained from a `DataIndex` and never see later writes; absorbing
/// new data means loading a fresh snapshot and building new models from it.
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    pub(crate) movies: HashMap<MovieId, Movie>,

    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// All movies, in no particular order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// Every movie id in the catalog, ascending.
    pub fn movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Every user that has at least one rating, ascending.
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a movie
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every rating in the snapshot, grouped by user.
    pub fn ratings(&self) -> impl Iterator<Item = &Rating> {
        self.user_ratings.values().flatten()
    }

    /// Get precomputed statistics for a movie
    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// Insert a movie into the index, replacing any movie with the same id
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Insert a rating and update indices.
    ///
    /// A rating for a (user, movie) pair that already exists replaces the
    /// old one in both indices.
    pub fn insert_rating(&mut self, rating: Rating) {
        upsert(
            self.user_ratings.entry(rating.user_id).or_default(),
            rating,
        );
        upsert(
            self.movie_ratings.entry(rating.movie_id).or_default(),
            rating,
        );
    }

    /// Get counts for debugging/validation: (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.user_ratings.len(), self.movies.len(), total_ratings)
    }
}

fn upsert(ratings: &mut Vec<Rating>, rating: Rating) {
    match ratings
        .iter_mut()
        .find(|r| r.user_id == rating.user_id && r.movie_id == rating.movie_id)
    {
        Some(existing) => *existing = rating,
        None => ratings.push(rating),
    }
}
