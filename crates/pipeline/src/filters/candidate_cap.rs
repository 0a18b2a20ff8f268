//! Upper bound on the number of candidates scored per request.
//!
//! Scoring cost is linear in the candidate count, so very large catalogs are
//! cut down to a fixed size. The cut is not quality-preserving: it keeps the
//! leading candidates in input order (ascending movie id for the standard
//! pipeline) and drops the rest, which makes results deterministic but means
//! movies beyond the cap are never recommended.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::MovieId;
use models::UserContext;
use tracing::warn;

/// Cap applied when the engine configuration does not set one
pub const DEFAULT_CANDIDATE_CAP: usize = 10_000;

/// Keeps at most `cap` candidates.
pub struct CandidateCapFilter {
    cap: usize,
}

impl CandidateCapFilter {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }
}

impl Filter for CandidateCapFilter {
    fn name(&self) -> &str {
        "CandidateCapFilter"
    }

    fn apply(&self, mut candidates: Vec<MovieId>, context: &UserContext) -> Result<Vec<MovieId>> {
        if candidates.len() > self.cap {
            warn!(
                "User {}: {} candidates exceed the cap of {}, scoring only the first {}",
                context.user_id,
                candidates.len(),
                self.cap,
                self.cap
            );
            candidates.truncate(self.cap);
        }
        Ok(candidates)
    }
}
