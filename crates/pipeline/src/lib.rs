//! Candidate selection for hybrid recommendations.
//!
//! This crate provides:
//! - Filter trait and implementations for narrowing the candidate set
//! - FilterPipeline for composing filters
//! - `candidate_pipeline`, the standard chain used per request
//!
//! ## Architecture
//! Candidates start as the full catalog, enumerated in ascending movie id:
//! 1. AlreadyRatedFilter drops everything the user has rated
//! 2. CandidateCapFilter bounds how many candidates get scored
//!
//! The cap trades recommendation quality for latency: with a catalog larger
//! than the cap, movies past it are never scored for anyone.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{DEFAULT_CANDIDATE_CAP, candidate_pipeline};
//!
//! let pipeline = candidate_pipeline(DEFAULT_CANDIDATE_CAP);
//! let candidates = pipeline.apply(snapshot.movie_ids(), &context)?;
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use filter_pipeline::{FilterPipeline, candidate_pipeline};
pub use filters::DEFAULT_CANDIDATE_CAP;
pub use traits::Filter;
