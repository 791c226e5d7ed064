use image::DynamicImage;

use crate::bbox::Bbox;

/// One object found by a [`Detector`], box already clipped to the image.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    pub class_label: String,
    pub bbox: Bbox,
}

impl DetectedObject {
    pub fn new(class_label: impl Into<String>, bbox: Bbox) -> Self {
        Self {
            class_label: class_label.into(),
            bbox,
        }
    }
}

/// Anything able to turn an image into labelled boxes.
///
/// The onnx runtime implementation lives in `ort_common`; tests substitute fixed
/// detections instead of loading model weights.
pub trait Detector {
    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<DetectedObject>>;
}
