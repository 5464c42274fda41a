// src/main.rs
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

mod errors;
mod gate;
mod models;
mod progress;
mod services;
mod shell;

use crate::gate::SubmissionGate;
use crate::models::{SourceAsset, declared_media_type};
use crate::services::{
    ClassifierClient, FileHistoryStore, HistoryStore, ImagePipeline, SampleCategory, SampleGallery,
    UploadReporter,
};

#[derive(Parser)]
#[command(
    name = "genlyz",
    about = "Checks whether an image is AI-generated or human-made"
)]
struct Cli {
    /// Classification endpoint. Falls back to GENLYZ_ENDPOINT, then
    /// the public service.
    #[arg(long)]
    endpoint: Option<String>,

    /// History log file. Falls back to GENLYZ_HISTORY.
    #[arg(long)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze an image file.
    Analyze { image: PathBuf },

    /// Analyze a random image from the bundled example gallery.
    Sample {
        /// Gallery root holding the real/ and fake/ directories.
        #[arg(long, default_value = "samples")]
        dir: PathBuf,

        #[arg(long, value_enum, default_value = "real")]
        category: CategoryArg,
    },

    /// Print past analysis results.
    History,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Real,
    Fake,
}

impl From<CategoryArg> for SampleCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Real => SampleCategory::Real,
            CategoryArg::Fake => SampleCategory::Fake,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let endpoint = cli
        .endpoint
        .or_else(|| std::env::var("GENLYZ_ENDPOINT").ok())
        .unwrap_or_else(|| services::classifier::DEFAULT_ENDPOINT.to_string());
    let history_path = cli
        .history
        .or_else(|| std::env::var("GENLYZ_HISTORY").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("genlyz-history.json"));
    let history = Arc::new(FileHistoryStore::new(history_path));

    match cli.command {
        Command::Analyze { image } => {
            let data = tokio::fs::read(&image)
                .await
                .with_context(|| format!("cannot read {}", image.display()))?;
            let name = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image")
                .to_string();
            let asset = SourceAsset::new(name, declared_media_type(&image), data.into());
            analyze(asset, &endpoint, history).await
        }
        Command::Sample { dir, category } => {
            let gallery = SampleGallery::new(dir);
            let pick = gallery
                .random_picks(category.into(), 1)
                .into_iter()
                .next()
                .context("empty sample gallery")?;
            info!("selected example {}", pick.display());
            let asset = gallery.load(&pick).await?;
            analyze(asset, &endpoint, history).await
        }
        Command::History => {
            let entries = history.read().await?;
            if entries.is_empty() {
                println!("No analyses recorded yet.");
                return Ok(());
            }
            for entry in entries {
                let label = if entry.is_ai_generated {
                    "AI-generated"
                } else {
                    "Human-generated"
                };
                println!(
                    "{}  {:<15}  {}% confidence  {} ({} bytes)",
                    entry.analyzed_at,
                    label,
                    entry.display_confidence(),
                    entry.image_data.name,
                    entry.image_data.size
                );
            }
            Ok(())
        }
    }
}

async fn analyze(
    asset: SourceAsset,
    endpoint: &str,
    history: Arc<FileHistoryStore>,
) -> anyhow::Result<()> {
    let mut gate = SubmissionGate::new(ImagePipeline::new());

    let report = gate.select(asset)?;
    if report.was_compressed() {
        println!("Compressed before upload: {}", report.summary());
    }

    let reporter = UploadReporter::new(Arc::new(ClassifierClient::new(endpoint)), history);
    let result = match reporter.submit(&mut gate).await {
        Ok(result) => result,
        Err(e) => {
            if !e.discards_selection() {
                info!("the selected image is kept; run the command again to retry");
            }
            return Err(e.into());
        }
    };

    println!("{} ({}% confidence)", result.label(), result.display_confidence());
    Ok(())
}
