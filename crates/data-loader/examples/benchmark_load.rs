use data_loader::{DirectoryStore, RatingStore};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let data_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/ml-latest-small".to_string());
    let store = DirectoryStore::new(&data_dir);

    println!("Loading MovieLens dataset from {data_dir}...\n");

    let start = Instant::now();
    let index = store.load_snapshot()?;
    let elapsed = start.elapsed();

    let (users, movies, ratings) = index.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!(
        "\nPerformance: {:.0} ratings/second",
        ratings as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
