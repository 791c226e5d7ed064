use std::path::PathBuf;

use inference_common::kmeans::{KMeans, DEFAULT_SEED};
use inference_common::similar_colors::DEFAULT_THRESHOLD;
use ort_common::YoloParams;

/// Yolov8 onnx weights, relative to the working directory.
pub const MODEL_PATH: &str = "model/yolov8m.onnx";
/// Color table, created on first use.
pub const DATABASE_PATH: &str = "colors_database.db";

/// Fixed settings of a run. Not exposed on the command line.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model_path: PathBuf,
    pub database_path: PathBuf,
    pub yolo: YoloParams,
    /// Clusters per crop; the most populated one is the dominant color.
    pub clusters: usize,
    pub seed: u64,
    /// RGB distance used to group similar colors in the run summary.
    pub similarity_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(MODEL_PATH),
            database_path: PathBuf::from(DATABASE_PATH),
            yolo: YoloParams::default(),
            clusters: 1,
            seed: DEFAULT_SEED,
            similarity_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn kmeans(&self) -> KMeans {
        KMeans::new(self.clusters, self.seed)
    }
}
