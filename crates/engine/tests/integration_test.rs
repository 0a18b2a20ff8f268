//! Integration tests for the recommender engine.
//!
//! Every test trains real models on a small in-memory catalog and checks the
//! ranking and rebuild behavior through the public API only.

use data_loader::{DataIndex, MemoryStore, Movie, MovieId, Rating, RatingStore, UserId};
use engine::{EngineConfig, HybridRecommender, RecommendError, RecommenderHandle, ScoredCandidate};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

const GENRES: &[&str] = &[
    "Action",
    "Action|Adventure",
    "Romance",
    "Romance|Drama",
    "Comedy",
    "Action|Sci-Fi",
    "Drama",
    "Comedy|Romance",
];

fn rating(user_id: UserId, movie_id: MovieId, rating: f32) -> Rating {
    Rating {
        user_id,
        movie_id,
        rating,
        timestamp: 1000000,
    }
}

/// 8 movies, 6 users with 6 ratings each
fn create_test_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (i, genres) in GENRES.iter().enumerate() {
        let id = i as MovieId + 1;
        store.insert_movie(Movie::new(id, format!("Movie {} (2001)", id), genres));
    }

    for user_id in 1..=6u32 {
        for movie_id in 1..=8u32 {
            if (user_id + movie_id) % 4 == 0 {
                continue;
            }
            let value = 1.0 + ((user_id * 3 + movie_id * 2) % 9) as f32 * 0.5;
            store.upsert_rating(rating(user_id, movie_id, value));
        }
    }
    store
}

/// Two taste groups over movies 1-6 (six co-rated movies per pair of users).
/// Users 1 and 2 also rated movie 7, users 3 and 4 also rated movie 8, so each
/// user has exactly one unrated movie that similar users have rated.
fn create_neighborhood_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (i, genres) in GENRES.iter().enumerate() {
        let id = i as MovieId + 1;
        store.insert_movie(Movie::new(id, format!("Movie {} (2001)", id), genres));
    }

    let shared: [(UserId, [f32; 6]); 4] = [
        (1, [5.0, 4.0, 4.0, 2.0, 1.0, 3.0]),
        (2, [4.0, 5.0, 4.0, 1.0, 2.0, 3.0]),
        (3, [2.0, 1.0, 2.0, 5.0, 4.0, 3.0]),
        (4, [1.0, 2.0, 1.0, 4.0, 5.0, 2.0]),
    ];
    for (user_id, values) in shared {
        for (i, value) in values.into_iter().enumerate() {
            store.upsert_rating(rating(user_id, i as MovieId + 1, value));
        }
    }
    store.upsert_rating(rating(1, 7, 5.0));
    store.upsert_rating(rating(2, 7, 4.5));
    store.upsert_rating(rating(3, 8, 4.0));
    store.upsert_rating(rating(4, 8, 3.5));
    store
}

fn build(store: Arc<MemoryStore>, config: EngineConfig) -> HybridRecommender {
    HybridRecommender::build(store, config).unwrap()
}

fn ids(results: &[ScoredCandidate]) -> Vec<MovieId> {
    results.iter().map(|r| r.movie_id).collect()
}

#[test]
fn test_recommend_excludes_rated_and_bounds_length() {
    let store = Arc::new(create_test_store());
    let recommender = build(store.clone(), EngineConfig::default());

    for user_id in 1..=6 {
        let rated: HashSet<MovieId> = store
            .user_ratings(user_id)
            .unwrap()
            .iter()
            .map(|r| r.movie_id)
            .collect();
        let unrated = recommender.catalog_size() - rated.len();

        for n in [0, 1, 2, 10] {
            let results = recommender.recommend(user_id, n).unwrap();
            assert!(results.len() <= n);
            assert!(results.len() <= unrated);
            assert!(results.iter().all(|r| !rated.contains(&r.movie_id)));
        }
    }
}

#[test]
fn test_recommend_sorted_and_bounded() {
    let store = Arc::new(create_test_store());
    let config = EngineConfig::default();
    let max_score = config.max_score();
    let recommender = build(store, config);

    for user_id in 1..=6 {
        let results = recommender.recommend(user_id, 10).unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].hybrid_score >= pair[1].hybrid_score);
        }
        for r in &results {
            assert!(r.hybrid_score <= max_score + 1e-4);
            assert!((0.5..=5.0).contains(&r.collaborative_score));
            assert!((0.0..=5.0).contains(&r.content_score));
        }
    }
}

#[test]
fn test_cold_start_is_uniform() {
    let store = Arc::new(create_test_store());
    let recommender = build(store, EngineConfig::default());

    let results = recommender.recommend(500, 5).unwrap();
    assert_eq!(ids(&results), vec![1, 2, 3, 4, 5]);
    for r in &results {
        assert_eq!(r.collaborative_score, 3.0);
        assert_eq!(r.content_score, 0.0);
        assert!((r.hybrid_score - 2.1).abs() < 1e-4);
    }
}

#[test]
fn test_weights_change_the_blend() {
    let store = Arc::new(create_test_store());
    let recommender = build(store, EngineConfig::default().with_weights(1.0, 0.0));

    for r in recommender.recommend(1, 10).unwrap() {
        assert!((r.hybrid_score - r.collaborative_score).abs() < 0.011);
    }
}

#[test]
fn test_user_who_rated_everything() {
    let store = Arc::new(create_test_store());
    for movie_id in 1..=8 {
        store.upsert_rating(rating(7, movie_id, 4.0));
    }
    let recommender = build(store, EngineConfig::default());

    assert!(recommender.recommend(7, 10).unwrap().is_empty());
}

#[test]
fn test_empty_catalog() {
    let recommender = build(Arc::new(MemoryStore::new()), EngineConfig::default());

    assert_eq!(recommender.catalog_size(), 0);
    assert!(recommender.recommend(1, 10).unwrap().is_empty());
}

#[test]
fn test_candidate_cap_keeps_lowest_ids() {
    let store = Arc::new(create_test_store());
    let recommender = build(store, EngineConfig::default().with_candidate_cap(3));

    let results = recommender.recommend(500, 10).unwrap();
    assert_eq!(ids(&results), vec![1, 2, 3]);
}

#[test]
fn test_explain_matches_recommend() {
    let store = Arc::new(create_test_store());
    let recommender = build(store, EngineConfig::default());

    for r in recommender.recommend(2, 10).unwrap() {
        let explanation = recommender.explain(2, r.movie_id).unwrap();
        assert_eq!(explanation.hybrid_score, r.hybrid_score);
        assert_eq!(explanation.collaborative_score, r.collaborative_score);
        assert_eq!(explanation.content_score, r.content_score);
    }
}

#[test]
fn test_explain_item_outside_candidates() {
    let store = Arc::new(create_test_store());
    let recommender = build(store.clone(), EngineConfig::default());

    let rated = store.user_ratings(1).unwrap()[0].movie_id;
    let explanation = recommender.explain(1, rated).unwrap();
    assert_eq!(explanation.movie_id, rated);
    assert!(explanation.content_score > 0.0);

    assert!(matches!(
        recommender.explain(1, 99),
        Err(RecommendError::UnknownItem(99))
    ));
}

#[test]
fn test_similar_items() {
    let store = Arc::new(create_test_store());
    let recommender = build(store, EngineConfig::default());

    for movie_id in 1..=8 {
        let similar = recommender.similar_items(movie_id, 3).unwrap();
        assert!(similar.len() <= 3);
        assert!(similar.iter().all(|&(id, _)| id != movie_id));
        for &(other, sim) in &similar {
            let back = recommender.content().similarity(other, movie_id).unwrap();
            assert!((sim - back).abs() < 1e-6);
        }
    }

    // "Action" is closest to the other Action movies
    let similar = recommender.similar_items(1, 2).unwrap();
    assert_eq!(similar.iter().map(|&(id, _)| id).collect::<Vec<_>>(), vec![2, 6]);

    assert!(matches!(
        recommender.similar_items(42, 3),
        Err(RecommendError::UnknownItem(42))
    ));
}

#[test]
fn test_new_user_uses_store_before_rebuild() {
    let store = Arc::new(create_test_store());
    let recommender = build(store.clone(), EngineConfig::default());

    store.upsert_rating(rating(50, 1, 5.0));

    let results = recommender.recommend(50, 10).unwrap();
    assert!(results.iter().all(|r| r.movie_id != 1));
    // Content signal comes from the store-backed rating
    assert!(results.iter().any(|r| r.content_score > 0.0));
}

#[test]
fn test_rebuild_resolves_new_user_without_affecting_others() {
    let store = Arc::new(create_test_store());
    let handle = RecommenderHandle::build(store.clone(), EngineConfig::default()).unwrap();

    let before: Vec<Vec<ScoredCandidate>> =
        (1..=6).map(|u| handle.recommend(u, 10).unwrap()).collect();
    assert!(!handle.current().collaborative().is_known_user(60));

    // Too few ratings to become anyone's neighbor
    store.upsert_rating(rating(60, 2, 4.5));
    store.upsert_rating(rating(60, 6, 4.0));

    let old = handle.current();
    assert_eq!(handle.rebuild().unwrap(), 1);
    assert_eq!(handle.generation(), 1);

    let current = handle.current();
    assert!(current.collaborative().is_known_user(60));
    assert!(!old.collaborative().is_known_user(60));

    let after: Vec<Vec<ScoredCandidate>> =
        (1..=6).map(|u| handle.recommend(u, 10).unwrap()).collect();
    assert_eq!(before, after);

    let results = handle.recommend(60, 10).unwrap();
    assert!(results.iter().all(|r| r.movie_id != 2 && r.movie_id != 6));
}

#[test]
fn test_failed_rebuild_keeps_active_model() {
    let store = Arc::new(create_test_store());
    let handle = RecommenderHandle::build(store.clone(), EngineConfig::default()).unwrap();

    // A rating for a movie outside the catalog fails snapshot validation
    store.upsert_rating(rating(1, 999, 4.0));

    assert!(matches!(handle.rebuild(), Err(RecommendError::Data(_))));
    assert_eq!(handle.generation(), 0);
    assert!(handle.recommend(1, 5).is_ok());
}

#[test]
fn test_invalid_config_is_rejected() {
    let store = Arc::new(create_test_store());
    let result = HybridRecommender::build(store, EngineConfig::default().with_weights(-1.0, 0.3));
    assert!(matches!(result, Err(RecommendError::InvalidConfig(_))));
}

#[test]
fn test_neighbors_produce_collaborative_scores() {
    let store = Arc::new(create_neighborhood_store());
    let recommender = build(store, EngineConfig::default());

    // (user, only unrated movie, hand-computed KNN-with-means estimate)
    for (user_id, movie_id, expected) in [(1, 8, 4.36), (2, 8, 4.29), (3, 7, 4.36), (4, 7, 3.99)] {
        let results = recommender.recommend(user_id, 10).unwrap();
        assert_eq!(ids(&results), vec![movie_id]);

        let r = results[0];
        assert_ne!(r.collaborative_score, engine::NEUTRAL_SCORE);
        assert!((r.collaborative_score - expected).abs() < 0.011);
        assert!(r.content_score > 0.0);
    }
}

#[test]
fn test_collaborative_only_blend() {
    let store = Arc::new(create_neighborhood_store());
    let recommender = build(store, EngineConfig::default().with_weights(1.0, 0.0));

    for user_id in 1..=4 {
        let r = recommender.recommend(user_id, 1).unwrap()[0];
        assert_ne!(r.collaborative_score, engine::NEUTRAL_SCORE);
        assert!((r.hybrid_score - r.collaborative_score).abs() < 0.011);
    }
}

#[test]
fn test_explain_matches_recommend_with_neighbors() {
    let store = Arc::new(create_neighborhood_store());
    let recommender = build(store, EngineConfig::default());

    for user_id in 1..=4 {
        let r = recommender.recommend(user_id, 1).unwrap()[0];
        let explanation = recommender.explain(user_id, r.movie_id).unwrap();
        assert_eq!(explanation.collaborative_score, r.collaborative_score);
        assert_eq!(explanation.content_score, r.content_score);
        assert_eq!(explanation.hybrid_score, r.hybrid_score);
    }
}

#[test]
fn test_rebuild_isolation_with_neighbors() {
    let store = Arc::new(create_neighborhood_store());
    let handle = RecommenderHandle::build(store.clone(), EngineConfig::default()).unwrap();

    let before: Vec<Vec<ScoredCandidate>> =
        (1..=4).map(|u| handle.recommend(u, 10).unwrap()).collect();
    assert!(before.iter().flatten().all(|r| r.collaborative_score != engine::NEUTRAL_SCORE));

    // The new user rates the movies others get predicted, but shares too few
    // movies with anyone to become a neighbor
    store.upsert_rating(rating(60, 7, 1.0));
    store.upsert_rating(rating(60, 8, 1.0));
    handle.rebuild().unwrap();

    assert!(handle.current().collaborative().is_known_user(60));
    let after: Vec<Vec<ScoredCandidate>> =
        (1..=4).map(|u| handle.recommend(u, 10).unwrap()).collect();
    assert_eq!(before, after);

    let results = handle.recommend(60, 10).unwrap();
    assert!(results.iter().all(|r| r.movie_id != 7 && r.movie_id != 8));
    assert!(results.iter().all(|r| r.collaborative_score == engine::NEUTRAL_SCORE));
}

/// Store whose next snapshot load blocks until released
struct GatedStore {
    inner: MemoryStore,
    armed: AtomicBool,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl RatingStore for GatedStore {
    fn load_snapshot(&self) -> data_loader::Result<DataIndex> {
        if self.armed.swap(false, Ordering::SeqCst) {
            if let Some(entered) = self.entered.lock().take() {
                let _ = entered.send(());
            }
            if let Some(release) = self.release.lock().take() {
                let _ = release.recv();
            }
        }
        self.inner.load_snapshot()
    }

    fn user_ratings(&self, user_id: UserId) -> data_loader::Result<Vec<Rating>> {
        self.inner.user_ratings(user_id)
    }
}

#[test]
fn test_concurrent_rebuild_fails_fast() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: create_test_store(),
        armed: AtomicBool::new(false),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(Some(release_rx)),
    });

    let handle = Arc::new(RecommenderHandle::build(store.clone(), EngineConfig::default()).unwrap());
    store.armed.store(true, Ordering::SeqCst);

    let background = {
        let handle = handle.clone();
        std::thread::spawn(move || handle.rebuild())
    };

    entered_rx.recv().unwrap();
    assert!(matches!(handle.rebuild(), Err(RecommendError::RebuildInProgress)));
    // Readers are served by the old model while the rebuild runs
    assert!(handle.recommend(1, 3).is_ok());
    assert_eq!(handle.generation(), 0);

    release_tx.send(()).unwrap();
    assert_eq!(background.join().unwrap().unwrap(), 1);
    assert_eq!(handle.generation(), 1);
}

#[tokio::test]
async fn test_rebuild_in_background() {
    let store = Arc::new(create_test_store());
    let handle = Arc::new(RecommenderHandle::build(store.clone(), EngineConfig::default()).unwrap());

    store.upsert_rating(rating(70, 3, 5.0));
    let generation = handle.clone().rebuild_in_background().await.unwrap();

    assert_eq!(generation, 1);
    assert!(handle.current().collaborative().is_known_user(70));
}
