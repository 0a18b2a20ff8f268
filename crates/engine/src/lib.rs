//! # Engine Crate
//!
//! Hybrid movie recommendations on top of the `models` crate.
//!
//! - `HybridRecommender`: an immutable, fully trained model answering
//!   `recommend`, `explain` and `similar_items`
//! - `RecommenderHandle`: owns the active recommender and replaces it
//!   atomically on `rebuild`
//! - `EngineConfig`: weights, neighborhood and candidate cap settings
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DirectoryStore;
//! use engine::{EngineConfig, RecommenderHandle};
//! use std::sync::Arc;
//!
//! let store = Arc::new(DirectoryStore::new("data/ml-latest-small"));
//! let handle = RecommenderHandle::build(store, EngineConfig::default())?;
//!
//! for rec in handle.recommend(1, 10)? {
//!     println!("{} -> {:.2}", rec.movie_id, rec.hybrid_score);
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod hybrid;

pub use config::{EngineConfig, NEUTRAL_SCORE};
pub use error::{RecommendError, Result};
pub use handle::RecommenderHandle;
pub use hybrid::{Explanation, HybridRecommender, ScoredCandidate, round2};
