//! Filter implementations for the candidate pipeline.

pub mod already_rated;
pub mod candidate_cap;

pub use already_rated::AlreadyRatedFilter;
pub use candidate_cap::{CandidateCapFilter, DEFAULT_CANDIDATE_CAP};
