//! FrameFind CLI - fingerprint a video corpus and search it by image.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod ffmpeg;

#[derive(Parser)]
#[command(name = "framefind")]
#[command(author, version, about = "Find the episode and timestamp behind a still frame", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint every video under a corpus root into the store
    Ingest {
        /// Corpus root scanned recursively for video files
        #[arg(long, value_name = "DIR")]
        corpus: PathBuf,

        /// Directory holding the fingerprint store
        #[arg(long, value_name = "DIR", default_value = "data")]
        data: PathBuf,

        /// Directory holding per-unit checkpoint marks
        #[arg(long, value_name = "DIR", default_value = "checkpoints")]
        checkpoints: PathBuf,

        /// Parallel worker count
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Perceptual hash family: dct, gradient, or mean
        #[arg(long, default_value = "dct")]
        family: String,

        /// Comma-separated video extensions to ingest
        #[arg(long, default_value = "mkv,mp4,avi")]
        extensions: String,
    },

    /// Search the store for the episode behind a still image
    Search {
        /// Path to the query image (JPEG, PNG, GIF, WebP)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Directory holding the fingerprint store
        #[arg(long, value_name = "DIR", default_value = "data")]
        data: PathBuf,

        /// Perceptual hash family the store was built with
        #[arg(long, default_value = "dct")]
        family: String,

        /// Number of results to return
        #[arg(short = 'k', long, default_value_t = 5)]
        top: usize,

        /// Minimum similarity percentage for the best match
        #[arg(long, default_value_t = 0.0)]
        min_similarity: f64,

        /// Emit results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Show store and checkpoint statistics
    Stats {
        /// Directory holding the fingerprint store
        #[arg(long, value_name = "DIR", default_value = "data")]
        data: PathBuf,

        /// Directory holding per-unit checkpoint marks
        #[arg(long, value_name = "DIR", default_value = "checkpoints")]
        checkpoints: PathBuf,

        /// Perceptual hash family the store was built with
        #[arg(long, default_value = "dct")]
        family: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            corpus,
            data,
            checkpoints,
            workers,
            family,
            extensions,
        } => commands::ingest::execute(corpus, data, checkpoints, workers, family, extensions).await,
        Commands::Search {
            image,
            data,
            family,
            top,
            min_similarity,
            json,
        } => commands::search::execute(image, data, family, top, min_similarity, json),
        Commands::Stats {
            data,
            checkpoints,
            family,
        } => commands::stats::execute(data, checkpoints, family),
    }
}
