//! # Models Crate
//!
//! The two signal sources behind hybrid recommendations, both trained once
//! from a `DataIndex` snapshot and read-only afterwards.
//!
//! ## Components
//!
//! ### Collaborative Model
//! User-based k-nearest-neighbor predictor with mean centering:
//! - cosine similarity between users over co-rated movies
//! - pairs need `min_support` co-rated movies to count as neighbors
//! - `predict(user, movie)` returns an estimated rating on the 0.5 - 5.0 scale
//!
//! ### Content Index
//! Item-to-item similarity from genre tags:
//! - TF-IDF over alphanumeric genre tokens, English stop words removed
//! - full pairwise cosine similarity matrix, built once
//! - `similarity(a, b)` and `nearest_items(movie, n)`
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{CollaborativeModel, ContentIndex, KnnParams};
//!
//! let snapshot = store.load_snapshot()?;
//! let collaborative = CollaborativeModel::fit(&snapshot, KnnParams::default());
//! let content = ContentIndex::build(&snapshot);
//!
//! let estimate = collaborative.predict(1, 260)?;
//! let similar = content.nearest_items(260, 10)?;
//! ```

pub mod collaborative;
pub mod content;
pub mod error;
pub mod matrix;
pub mod text;
pub mod user_context;

// Re-export commonly used types
pub use collaborative::{CollaborativeModel, KnnParams};
pub use content::ContentIndex;
pub use error::{ModelError, Result};
pub use matrix::SimilarityMatrix;
pub use text::{SparseVector, TfidfVectorizer};
pub use user_context::{RatingSource, UserContext, build_user_context};
