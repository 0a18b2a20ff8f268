//! The FilterPipeline orchestrates multiple filters.

use crate::filters::{AlreadyRatedFilter, CandidateCapFilter};
use crate::traits::Filter;
use anyhow::Result;
use data_loader::MovieId;
use models::UserContext;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyRatedFilter)
///     .add_filter(CandidateCapFilter::new(10_000));
///
/// let candidates = pipeline.apply(catalog_ids, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the candidates.
    ///
    /// The first failing filter aborts the pass.
    pub fn apply(&self, candidates: Vec<MovieId>, context: &UserContext) -> Result<Vec<MovieId>> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, context)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-request candidate chain: unrated movies, capped at `cap`.
///
/// Rated movies are removed before capping, so the cap only ever counts
/// movies the user could actually be recommended.
pub fn candidate_pipeline(cap: usize) -> FilterPipeline {
    FilterPipeline::new()
        .add_filter(AlreadyRatedFilter)
        .add_filter(CandidateCapFilter::new(cap))
}
