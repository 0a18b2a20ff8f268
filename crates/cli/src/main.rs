use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DirectoryStore, MovieId, RatingStore, UserId};
use engine::{EngineConfig, HybridRecommender, RecommenderHandle, ScoredCandidate};
use rand::seq::IndexedRandom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// ReelHybrid - Hybrid Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-hybrid")]
#[command(about = "Movie recommendations blending user-based KNN with genre similarity", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// JSON file with engine settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the collaborative weight
    #[arg(long)]
    collaborative_weight: Option<f32>,

    /// Override the content weight
    #[arg(long)]
    content_weight: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Break down the score of one movie for a user
    Explain {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        movie_id: MovieId,

        #[arg(long)]
        json: bool,
    },

    /// Movies with the most similar genres
    Similar {
        #[arg(long)]
        movie_id: MovieId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show a user's ratings, newest first
    Ratings {
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },

    /// Retrain both models from the dataset and swap them in
    Rebuild,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = Arc::new(DirectoryStore::new(&cli.data_dir));

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            json,
        } => handle_recommend(&build_handle(store, config)?, user_id, limit, json)?,
        Commands::Explain {
            user_id,
            movie_id,
            json,
        } => handle_explain(&build_handle(store, config)?, user_id, movie_id, json)?,
        Commands::Similar { movie_id, limit } => {
            handle_similar(&build_handle(store, config)?, movie_id, limit)?
        }
        Commands::Ratings { user_id } => handle_ratings(store.as_ref(), user_id)?,
        Commands::Search { title } => handle_search(store.as_ref(), &title)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(Arc::new(build_handle(store, config)?), requests, concurrent).await?,
        Commands::Rebuild => handle_rebuild(Arc::new(build_handle(store, config)?)).await?,
    }

    Ok(())
}

/// Train the first model generation
fn build_handle(store: Arc<DirectoryStore>, config: EngineConfig) -> Result<RecommenderHandle> {
    println!("Training models on {}...", store.data_dir().display());
    let start = Instant::now();
    let handle = RecommenderHandle::build(store, config).context("Failed to build recommender")?;
    println!("{} Models ready in {:.2?}", "✓".green(), start.elapsed());
    Ok(handle)
}

/// Config file (if any), then per-run weight overrides
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .with_weight_overrides(cli.collaborative_weight, cli.content_weight);

    config.validate()?;
    debug!(?config, "Engine configuration");
    Ok(config)
}

/// Handle the 'recommend' command
fn handle_recommend(
    handle: &RecommenderHandle,
    user_id: UserId,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let recommender = handle.current();
    let start = Instant::now();
    let recommendations = match limit {
        Some(n) => recommender.recommend(user_id, n)?,
        None => recommender.recommend_default(user_id)?,
    };
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    if !recommender.collaborative().is_known_user(user_id) {
        println!(
            "{}",
            format!("User {} is not in the training data", user_id).yellow()
        );
    }
    print_recommendations(&recommender, user_id, &recommendations);
    println!("Ranked in {:.2?}", elapsed);
    Ok(())
}

/// Handle the 'explain' command
fn handle_explain(
    handle: &RecommenderHandle,
    user_id: UserId,
    movie_id: MovieId,
    json: bool,
) -> Result<()> {
    let explanation = handle.explain(user_id, movie_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
        return Ok(());
    }

    println!("{}", explanation.title.bold().blue());
    println!("{}Genres: {}", "• ".green(), explanation.genres);
    println!(
        "{}Collaborative: {:.2} x {:.2}",
        "• ".cyan(),
        explanation.collaborative_score,
        explanation.collaborative_weight
    );
    println!(
        "{}Content:       {:.2} x {:.2}",
        "• ".cyan(),
        explanation.content_score,
        explanation.content_weight
    );
    println!(
        "{}Hybrid:        {}",
        "• ".cyan(),
        format!("{:.2}", explanation.hybrid_score).bold()
    );
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(handle: &RecommenderHandle, movie_id: MovieId, limit: usize) -> Result<()> {
    let recommender = handle.current();
    let similar = recommender.similar_items(movie_id, limit)?;

    if let Some(movie) = recommender.movie(movie_id) {
        println!(
            "{}",
            format!("Movies similar to {} [{}]:", movie.title, movie.genres_string())
                .bold()
                .blue()
        );
    }
    for (rank, (other, similarity)) in similar.iter().enumerate() {
        let (title, genres) = recommender
            .movie(*other)
            .map(|m| (m.title.as_str(), m.genres_string()))
            .unwrap_or(("<unknown>", String::new()));
        println!(
            "{}. {} [{}] - similarity {:.3}",
            (rank + 1).to_string().green(),
            title,
            genres,
            similarity
        );
    }
    Ok(())
}

/// Handle the 'ratings' command
fn handle_ratings(store: &DirectoryStore, user_id: UserId) -> Result<()> {
    let mut ratings = store
        .user_ratings(user_id)
        .context("Failed to read ratings")?;
    if ratings.is_empty() {
        bail!("User {} has no ratings", user_id);
    }
    let index = store.load_snapshot().context("Failed to load catalog")?;

    ratings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let average: f32 = ratings.iter().map(|r| r.rating).sum::<f32>() / ratings.len() as f32;
    println!("{}", format!("User {}", user_id).bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), ratings.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), average);

    for rating in &ratings {
        let title = index
            .get_movie(rating.movie_id)
            .map(|m| m.title.as_str())
            .unwrap_or("<unknown>");
        println!("  {:>4.1}  {} ({})", rating.rating, title, rating.movie_id);
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(store: &DirectoryStore, title: &str) -> Result<()> {
    let index = store.load_snapshot().context("Failed to load MovieLens dataset")?;
    let needle = title.to_lowercase();

    // (exact match?, average rating, movie)
    let mut matches: Vec<_> = index
        .movies()
        .filter_map(|movie| {
            let haystack = movie.title.to_lowercase();
            if !haystack.contains(&needle) {
                return None;
            }
            let avg_rating = index
                .get_movie_stats(movie.id)
                .map(|s| s.avg_rating)
                .unwrap_or(0.0);
            Some((haystack == needle, avg_rating, movie))
        })
        .collect();

    // Exact match first, then by average rating
    matches.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.total_cmp(&a.1))
            .then_with(|| a.2.id.cmp(&b.2.id))
    });

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    for (_, avg_rating, movie) in matches.iter().take(20) {
        let rating_count = index
            .get_movie_stats(movie.id)
            .map(|s| s.rating_count)
            .unwrap_or(0);
        println!(
            "{}: {} [{}] avg {:.2} ({} ratings)",
            movie.id,
            movie.title,
            movie.genres_string(),
            avg_rating,
            rating_count
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    handle: Arc<RecommenderHandle>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids = handle.current().snapshot().user_ids();
    if user_ids.is_empty() {
        bail!("Dataset has no users to benchmark with");
    }

    let sample: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests)
            .filter_map(|_| user_ids.choose(&mut rng).copied())
            .collect()
    };

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let start = Instant::now();

    let mut tasks = Vec::with_capacity(sample.len());
    for user_id in sample {
        let handle = handle.clone();
        let permit = semaphore.clone().acquire_owned().await?;
        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            handle.recommend(user_id, 10)?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(tasks.len());
    for task in tasks {
        timings.push(task.await??);
    }
    let total_time = start.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", timings.len(), concurrent);
    println!("Total time: {:.2?}", total_time);
    println!("Average latency: {:.2?}", avg_latency);
    println!("P50 latency: {:.2?}", percentile(0.50));
    println!("P95 latency: {:.2?}", percentile(0.95));
    println!("P99 latency: {:.2?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Handle the 'rebuild' command
async fn handle_rebuild(handle: Arc<RecommenderHandle>) -> Result<()> {
    let start = Instant::now();
    let generation = handle.clone().rebuild_in_background().await?;
    println!(
        "{} Swapped in generation {} after {:.2?}",
        "✓".green(),
        generation,
        start.elapsed()
    );

    let (users, movies, ratings) = handle.current().snapshot().counts();
    println!("{} users, {} movies, {} ratings", users, movies, ratings);
    Ok(())
}

fn print_recommendations(
    recommender: &HybridRecommender,
    user_id: UserId,
    recommendations: &[ScoredCandidate],
) {
    println!(
        "{}",
        format!("Recommendations for user {}:", user_id).bold().blue()
    );
    if recommendations.is_empty() {
        println!("  (nothing left to recommend)");
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        let (title, genres) = recommender
            .movie(rec.movie_id)
            .map(|m| (m.title.as_str(), m.genres_string()))
            .unwrap_or(("<unknown>", String::new()));
        println!(
            "{}. {} [{}] - Score: {:.2} (collaborative {:.2}, content {:.2})",
            (rank + 1).to_string().green(),
            title,
            genres,
            rec.hybrid_score,
            rec.collaborative_score,
            rec.content_score
        );
    }
}
