//! detect -> crop -> cluster -> record, for one image at a time.

use std::path::Path;

use anyhow::Context;
use color_db::ColorDatabase;
use image::DynamicImage;
use inference_common::color::ColorObservation;
use inference_common::color_extractor::ColorAnalyzer;
use inference_common::detector::Detector;
use inference_common::loader::load_image;
use inference_common::similar_colors::group_similar;
use inference_common::Error;

use crate::summary::RunSummary;

/// Owns every stage of the pipeline. The detector is whatever the caller built,
/// so tests can hand in fixed detections.
pub struct Pipeline<D> {
    detector: D,
    analyzer: ColorAnalyzer,
    database: ColorDatabase,
    similarity_threshold: f64,
}

impl<D: Detector> Pipeline<D> {
    pub fn new(
        detector: D,
        analyzer: ColorAnalyzer,
        database: ColorDatabase,
        similarity_threshold: f64,
    ) -> Self {
        Self {
            detector,
            analyzer,
            database,
            similarity_threshold,
        }
    }

    pub fn database(&self) -> &ColorDatabase {
        &self.database
    }

    /// Loads the image at `path` and runs it through the pipeline.
    pub fn process_image(&mut self, path: &Path) -> anyhow::Result<RunSummary> {
        let _span = tracing::info_span!("process_image", path = %path.display()).entered();

        let image = load_image(path)?;
        self.process(&image)
    }

    /// Runs an already decoded image through detection, color analysis and recording.
    ///
    /// Each observation is committed as soon as it is produced; a failure part way
    /// through leaves earlier rows in place.
    pub fn process(&mut self, image: &DynamicImage) -> anyhow::Result<RunSummary> {
        let detections = self
            .detector
            .detect(image)
            .context("Object detection failed")?;

        let mut summary = RunSummary {
            detections: detections.len(),
            ..Default::default()
        };
        if detections.is_empty() {
            log::info!("No objects found");
            return Ok(summary);
        }
        log::info!("Found {} objects", detections.len());

        for object in detections {
            let dominant_color = match self.analyzer.dominant_color(image, &object.bbox) {
                Ok(color) => color,
                Err(Error::EmptyCrop(bbox)) => {
                    log::warn!(
                        "Skipping {}: bounding box {bbox:?} is empty inside the image",
                        object.class_label
                    );
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let observation = ColorObservation {
                class_label: object.class_label,
                dominant_color,
            };
            let record = self.database.record(&observation)?;
            summary.records.push(record);
            summary.observations.push(observation);
        }

        summary.similar_groups = group_similar(&summary.observations, self.similarity_threshold);
        Ok(summary)
    }
}
