//! Per-image grouping of observations whose colors are close in RGB space.

use crate::color::{ColorObservation, Rgb};

/// Default RGB distance below which two colors count as similar.
pub const DEFAULT_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarGroup {
    /// Class of the first observation that opened the group.
    pub class_label: String,
    pub color: Rgb,
    pub count: usize,
}

/// Groups observations greedily in input order: each one joins the first
/// existing group whose color is closer than `threshold`, else opens a new one.
pub fn group_similar(observations: &[ColorObservation], threshold: f64) -> Vec<SimilarGroup> {
    let mut groups: Vec<SimilarGroup> = Vec::new();
    for obs in observations {
        match groups
            .iter_mut()
            .find(|group| group.color.distance(&obs.dominant_color) < threshold)
        {
            Some(group) => group.count += 1,
            None => groups.push(SimilarGroup {
                class_label: obs.class_label.clone(),
                color: obs.dominant_color,
                count: 1,
            }),
        }
    }
    groups
}
