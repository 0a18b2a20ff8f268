//! Content Similarity Index - item-to-item similarity from genre tags
//!
//! ## Algorithm
//! 1. Give every catalog movie a dense index, in ascending movie id order
//! 2. Vectorize each movie's genre string with TF-IDF over the whole catalog
//! 3. Precompute the cosine similarity of every pair of movies once
//!
//! The matrix is O(N²) in catalog size and is the dominant memory cost of a
//! built model; queries only read it.

use crate::error::{ModelError, Result};
use crate::matrix::SimilarityMatrix;
use crate::text::TfidfVectorizer;
use data_loader::{DataIndex, MAX_RATING, Movie, MovieId};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Genre-based similarity between catalog movies
#[derive(Debug, Clone)]
pub struct ContentIndex {
    /// Dense index -> movie id
    movie_ids: Vec<MovieId>,
    /// Movie id -> dense index
    positions: HashMap<MovieId, usize>,
    matrix: SimilarityMatrix,
}

impl ContentIndex {
    /// Build the index from the catalog of a snapshot
    pub fn build(snapshot: &DataIndex) -> Self {
        Self::from_movies(snapshot.movies())
    }

    /// Build the index from any set of movies
    #[instrument(skip_all)]
    pub fn from_movies<'a>(movies: impl IntoIterator<Item = &'a Movie>) -> Self {
        let mut movies: Vec<&Movie> = movies.into_iter().collect();
        movies.sort_unstable_by_key(|m| m.id);
        movies.dedup_by_key(|m| m.id);

        let documents: Vec<String> = movies.iter().map(|m| m.genres_string()).collect();
        let mut vectorizer = TfidfVectorizer::new();
        let vectors = vectorizer.fit_transform(&documents);
        let matrix = SimilarityMatrix::from_normalized(&vectors);

        let movie_ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
        let positions = movie_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        info!(
            "Content index built: {} movies, {} terms",
            movie_ids.len(),
            vectorizer.vocabulary().len()
        );

        Self {
            movie_ids,
            positions,
            matrix,
        }
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.positions.contains_key(&movie_id)
    }

    fn position(&self, movie_id: MovieId) -> Result<usize> {
        self.positions
            .get(&movie_id)
            .copied()
            .ok_or(ModelError::UnknownItem(movie_id))
    }

    /// Cosine similarity of two movies' genre vectors, in [0, 1]
    pub fn similarity(&self, a: MovieId, b: MovieId) -> Result<f32> {
        Ok(self.matrix.get(self.position(a)?, self.position(b)?))
    }

    /// Up to `n` most similar other movies, most similar first.
    ///
    /// Ties are broken by ascending movie id; the movie itself is never returned.
    pub fn nearest_items(&self, movie_id: MovieId, n: usize) -> Result<Vec<(MovieId, f32)>> {
        let position = self.position(movie_id)?;

        let mut neighbors: Vec<(usize, f32)> = self
            .matrix
            .row(position)
            .filter(|&(idx, _)| idx != position)
            .collect();

        // Dense indices follow movie id order, so comparing them orders ties by id
        let by_similarity =
            |a: &(usize, f32), b: &(usize, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));

        if n < neighbors.len() {
            neighbors.select_nth_unstable_by(n, by_similarity);
            neighbors.truncate(n);
        }
        neighbors.sort_unstable_by(by_similarity);

        Ok(neighbors
            .into_iter()
            .map(|(idx, sim)| (self.movie_ids[idx], sim))
            .collect())
    }

    /// Average of `similarity(candidate, rated) * rating / 5` over the user's
    /// rated movies.
    ///
    /// Rated movies missing from the index are skipped; with no usable rated
    /// movie the result is 0.0.
    pub fn weighted_similarity(&self, candidate: MovieId, rated: &[(MovieId, f32)]) -> Result<f32> {
        let position = self.position(candidate)?;

        let (total, count) = rated
            .iter()
            .filter_map(|&(movie_id, rating)| {
                let other = *self.positions.get(&movie_id)?;
                Some(self.matrix.get(position, other) * (rating / MAX_RATING))
            })
            .fold((0.0f32, 0usize), |(total, count), w| (total + w, count + 1));

        Ok(if count == 0 { 0.0 } else { total / count as f32 })
    }
}
