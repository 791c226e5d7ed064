use std::fmt;

use color_db::ColorRecord;
use inference_common::color::ColorObservation;
use inference_common::similar_colors::SimilarGroup;

/// What a single image contributed.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Objects returned by the detector.
    pub detections: usize,
    /// Objects dropped because their crop was empty.
    pub skipped: usize,
    pub observations: Vec<ColorObservation>,
    /// Rows as they stand after this run's upserts, in observation order.
    pub records: Vec<ColorRecord>,
    pub similar_groups: Vec<SimilarGroup>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detections == 0 {
            return writeln!(f, "No objects detected.");
        }

        writeln!(
            f,
            "Detected {} objects ({} recorded, {} skipped)",
            self.detections,
            self.records.len(),
            self.skipped
        )?;
        for record in &self.records {
            writeln!(
                f,
                "  {:<16} {:<20} {:<10} similar_count={}",
                record.class_label,
                record.color.to_string(),
                record.color.name(),
                record.similar_count
            )?;
        }

        if !self.similar_groups.is_empty() {
            writeln!(f, "Similar colors in this image:")?;
            for group in &self.similar_groups {
                writeln!(
                    f,
                    "  {:<16} {:<20} x{}",
                    group.class_label,
                    group.color.to_string(),
                    group.count
                )?;
            }
        }
        Ok(())
    }
}
