use inference_common::bbox::Bbox;

/// Greedy non-maximum suppression, applied per class.
///
/// Input is `(class_idx, bbox)`; output keeps the highest-confidence box of every
/// overlapping cluster, ordered by descending confidence.
pub fn non_maximum_suppression(
    mut candidates: Vec<(usize, Bbox)>,
    iou_threshold: f32,
) -> Vec<(usize, Bbox)> {
    candidates.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));

    let mut kept: Vec<(usize, Bbox)> = Vec::with_capacity(candidates.len());
    for (class_idx, bbox) in candidates {
        let suppressed = kept
            .iter()
            .any(|(kept_class, kept_bbox)| *kept_class == class_idx && kept_bbox.iou(&bbox) > iou_threshold);
        if !suppressed {
            kept.push((class_idx, bbox));
        }
    }
    kept
}
