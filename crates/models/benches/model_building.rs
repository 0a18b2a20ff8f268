//! Benchmarks for model fitting and lookups
//!
//! Run with: cargo bench --package models
//!
//! Uses a synthetic catalog so no dataset is needed.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::{DataIndex, Movie, MovieId, Rating, UserId};
use models::{CollaborativeModel, ContentIndex, KnnParams};

const GENRES: &[&str] = &[
    "Action", "Adventure", "Animation", "Children", "Comedy", "Crime", "Drama", "Fantasy",
    "Horror", "Mystery", "Romance", "Sci-Fi", "Thriller", "War", "Western",
];

fn synthetic_index(users: UserId, movies: MovieId) -> DataIndex {
    let movie_list: Vec<Movie> = (1..=movies)
        .map(|id| {
            let a = GENRES[id as usize % GENRES.len()];
            let b = GENRES[(id as usize * 7) % GENRES.len()];
            Movie::new(id, format!("Movie {id} (2000)"), &format!("{a}|{b}"))
        })
        .collect();

    let mut ratings = Vec::new();
    for user_id in 1..=users {
        for step in 0..40u32 {
            let movie_id = (user_id * 13 + step * 17) % movies + 1;
            ratings.push(Rating {
                user_id,
                movie_id,
                rating: ((user_id + movie_id) % 10) as f32 * 0.5 + 0.5,
                timestamp: 0,
            });
        }
    }

    DataIndex::from_parts(movie_list, ratings)
}

fn bench_fit_collaborative(c: &mut Criterion) {
    let index = synthetic_index(600, 2000);
    c.bench_function("collaborative_fit", |b| {
        b.iter(|| CollaborativeModel::fit(black_box(&index), KnnParams::default()))
    });
}

fn bench_build_content(c: &mut Criterion) {
    let index = synthetic_index(10, 2000);
    c.bench_function("content_index_build", |b| {
        b.iter(|| ContentIndex::build(black_box(&index)))
    });
}

fn bench_predict(c: &mut Criterion) {
    let index = synthetic_index(600, 2000);
    let model = CollaborativeModel::fit(&index, KnnParams::default());
    c.bench_function("collaborative_predict", |b| {
        b.iter(|| model.predict(black_box(1), black_box(500)))
    });
}

fn bench_nearest_items(c: &mut Criterion) {
    let index = synthetic_index(10, 2000);
    let content = ContentIndex::build(&index);
    c.bench_function("content_nearest_items", |b| {
        b.iter(|| content.nearest_items(black_box(1), black_box(10)))
    });
}

criterion_group!(
    benches,
    bench_fit_collaborative,
    bench_build_content,
    bench_predict,
    bench_nearest_items
);
criterion_main!(benches);
