use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use color_db::ColorDatabase;
use image_ort::{Pipeline, PipelineConfig};
use inference_common::color_extractor::ColorAnalyzer;
use ort::execution_providers::CPUExecutionProvider;
use ort_common::YoloDetector;
use tracing_subscriber::prelude::*;

/// Detect objects in an image and record each object's dominant color.
#[derive(Debug, Parser)]
pub struct Args {
    /// Path to input image (.jpeg/.png).
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warn,image_ort=info,ort_common=info,color_db=info,inference_common=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = PipelineConfig::default();

    // Load model into ort.
    ort::init()
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .commit()?;
    let detector = YoloDetector::load(&config.model_path, config.yolo.clone())?;
    log::debug!("{:?}", detector.params());

    let database = ColorDatabase::open(&config.database_path)?;
    let mut pipeline = Pipeline::new(
        detector,
        ColorAnalyzer::new(config.kmeans()),
        database,
        config.similarity_threshold,
    );

    let summary = pipeline
        .process_image(&args.input)
        .with_context(|| format!("Failed to process {:?}", args.input))?;
    print!("{summary}");

    Ok(())
}
