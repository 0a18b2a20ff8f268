//! Swappable owner of the active recommender.
//!
//! Readers clone the current `Arc` and keep using it for the whole request, so
//! a rebuild never shows them a half-built model: the new instance is built
//! completely outside the lock and then swapped in with one pointer write.

use crate::config::EngineConfig;
use crate::error::{RecommendError, Result};
use crate::hybrid::{Explanation, HybridRecommender, ScoredCandidate};
use data_loader::{MovieId, RatingStore, UserId};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, instrument};

pub struct RecommenderHandle {
    store: Arc<dyn RatingStore>,
    config: EngineConfig,
    active: RwLock<Arc<HybridRecommender>>,
    /// Held for the duration of a rebuild
    rebuild_lock: Mutex<()>,
    generation: AtomicU64,
}

impl RecommenderHandle {
    /// Build the first model; generation 0
    pub fn build(store: Arc<dyn RatingStore>, config: EngineConfig) -> Result<Self> {
        let recommender = HybridRecommender::build(store.clone(), config.clone())?;
        Ok(Self {
            store,
            config,
            active: RwLock::new(Arc::new(recommender)),
            rebuild_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        })
    }

    /// The model serving requests right now
    pub fn current(&self) -> Arc<HybridRecommender> {
        self.active.read().clone()
    }

    /// Number of completed rebuilds
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Retrain from a fresh store snapshot and swap it in.
    ///
    /// Fails with `RebuildInProgress` instead of waiting when another rebuild
    /// is running. On failure the active model is left untouched.
    #[instrument(skip(self))]
    pub fn rebuild(&self) -> Result<u64> {
        let _guard = self
            .rebuild_lock
            .try_lock()
            .ok_or(RecommendError::RebuildInProgress)?;

        let start = Instant::now();
        let fresh = HybridRecommender::build(self.store.clone(), self.config.clone())?;
        *self.active.write() = Arc::new(fresh);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        info!(
            "Swapped in model generation {} after {:.2?}",
            generation,
            start.elapsed()
        );
        Ok(generation)
    }

    /// Run `rebuild` on the blocking thread pool
    pub async fn rebuild_in_background(self: Arc<Self>) -> Result<u64> {
        tokio::task::spawn_blocking(move || self.rebuild()).await?
    }

    pub fn recommend(&self, user_id: UserId, n: usize) -> Result<Vec<ScoredCandidate>> {
        self.current().recommend(user_id, n)
    }

    pub fn explain(&self, user_id: UserId, movie_id: MovieId) -> Result<Explanation> {
        self.current().explain(user_id, movie_id)
    }

    pub fn similar_items(&self, movie_id: MovieId, n: usize) -> Result<Vec<(MovieId, f32)>> {
        self.current().similar_items(movie_id, n)
    }
}
