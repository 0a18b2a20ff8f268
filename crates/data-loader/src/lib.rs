//! # Data Loader Crate
//!
//! This crate loads the MovieLens rating store into memory and defines how the
//! rest of the workspace talks to it.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, DataIndex)
//! - **parser**: Parse MovieLens CSV or .dat files into Rust structs
//! - **index**: Build the validated in-memory snapshot
//! - **store**: The `RatingStore` trait plus file-backed and in-memory stores
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DirectoryStore, RatingStore};
//!
//! let store = DirectoryStore::new("data/ml-latest-small");
//! let snapshot = store.load_snapshot()?;
//!
//! let movie = snapshot.get_movie(1).unwrap();
//! let ratings = snapshot.get_user_ratings(1);
//!
//! println!("{} has genres {}", movie.title, movie.genres_string());
//! println!("User 1 rated {} movies", ratings.len());
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use parser::DatasetFormat;
pub use store::{DirectoryStore, MemoryStore, RatingStore};
pub use types::{
    DataIndex, GENRE_SEPARATOR, MAX_RATING, MIN_RATING, Movie, MovieId, MovieStats, Rating,
    UserId,
};
