//! Yolov8 object detection on top of an ort session.

use std::path::Path;

use anyhow::{Context, bail};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use inference_common::bbox::Bbox;
use inference_common::coco_classes;
use inference_common::detector::{DetectedObject, Detector};
use ndarray::{Array4, CowArray};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use crate::nms::non_maximum_suppression;

#[derive(Debug, Clone)]
pub struct YoloParams {
    /// Square model input, 640 for the stock exports.
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

/// Pretrained yolov8 model, loaded once and reused for every image.
pub struct YoloDetector {
    session: Session,
    params: YoloParams,
}

impl YoloDetector {
    /// Loads the onnx weights at `path`.
    pub fn load(path: &Path, params: YoloParams) -> Result<Self, inference_common::Error> {
        let model_err = |source: anyhow::Error| inference_common::Error::ModelLoad {
            path: path.to_path_buf(),
            source,
        };

        if !path.exists() {
            return Err(model_err(anyhow::anyhow!("weight file does not exist")));
        }
        let session = build_session(path).map_err(model_err)?;
        log::debug!("{session:?}");
        log::info!("Prepared ort cpu session with model: {path:?}");

        Ok(Self { session, params })
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }
}

fn build_session(path: &Path) -> anyhow::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(path)
        .context("Failed to create ort session")?;
    Ok(session)
}

impl Detector for YoloDetector {
    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<DetectedObject>> {
        let (img_width, img_height) = (image.width(), image.height());
        let size = self.params.input_size;

        let input = preprocess(image, size)?;
        let input_dyn = CowArray::from(input).into_dyn();
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(&input_dyn)?])?;
        let (shape, output) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let candidates = decode_output(
            output,
            &dims,
            coco_classes::NAMES.len(),
            self.params.conf_threshold,
        )?;
        log::debug!("{} candidates above confidence threshold", candidates.len());
        let kept = non_maximum_suppression(candidates, self.params.iou_threshold);

        let sx = img_width as f32 / size as f32;
        let sy = img_height as f32 / size as f32;
        let detections = kept
            .into_iter()
            .map(|(class_idx, bbox)| {
                DetectedObject::new(
                    coco_classes::name(class_idx),
                    bbox.scale(sx, sy).clip(img_width, img_height),
                )
            })
            .collect();
        Ok(detections)
    }
}

/// Resizes to the square model input and lays the pixels out as normalized NCHW.
pub fn preprocess(image: &DynamicImage, size: u32) -> anyhow::Result<Array4<f32>> {
    let src = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut dst = Image::new(size, size, PixelType::U8x3);
    Resizer::new().resize(
        &src,
        &mut dst,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    let side = size as usize;
    let mut array = Array4::<f32>::zeros((1, 3, side, side));
    for (idx, pixel) in dst.buffer().chunks_exact(3).enumerate() {
        let (y, x) = (idx / side, idx % side);
        array[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        array[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        array[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }
    Ok(array)
}

/// Decodes the raw `[1, 4 + classes, anchors]` output into per-anchor best-class
/// boxes, in model input coordinates.
///
/// `dims` is the tensor shape reported by the session; anything other than
/// `[1, 4 + num_classes, anchors]` backed by exactly that many values is an error.
pub fn decode_output(
    output: &[f32],
    dims: &[i64],
    num_classes: usize,
    conf_threshold: f32,
) -> anyhow::Result<Vec<(usize, Bbox)>> {
    let channels = 4 + num_classes;
    let anchors = match *dims {
        [1, c, a] if c == channels as i64 && a > 0 => a as usize,
        _ => bail!("unexpected yolo output shape {dims:?}, expected [1, {channels}, anchors]"),
    };
    if output.len() != channels * anchors {
        bail!(
            "yolo output holds {} values, shape {dims:?} needs {}",
            output.len(),
            channels * anchors
        );
    }
    let at = |channel: usize, anchor: usize| output[channel * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_idx, confidence) = (0..num_classes)
            .map(|class_idx| (class_idx, at(4 + class_idx, anchor)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if confidence < conf_threshold {
            continue;
        }

        let bbox = Bbox::from_center(
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
            confidence,
        );
        candidates.push((class_idx, bbox));
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Builds a channel-major output with the given (cx, cy, w, h, class, score) anchors.
    fn raw_output(num_classes: usize, anchors: &[(f32, f32, f32, f32, usize, f32)]) -> Vec<f32> {
        let n = anchors.len();
        let mut out = vec![0.0; (4 + num_classes) * n];
        for (i, &(cx, cy, w, h, class_idx, score)) in anchors.iter().enumerate() {
            out[i] = cx;
            out[n + i] = cy;
            out[2 * n + i] = w;
            out[3 * n + i] = h;
            out[(4 + class_idx) * n + i] = score;
        }
        out
    }

    #[test]
    fn decode_filters_by_confidence() {
        let out = raw_output(
            3,
            &[
                (100.0, 100.0, 20.0, 40.0, 2, 0.9),
                (300.0, 300.0, 10.0, 10.0, 1, 0.1),
            ],
        );
        let candidates = decode_output(&out, &[1, 7, 2], 3, 0.25).unwrap();
        assert_eq!(
            candidates,
            vec![(2, Bbox::new(90.0, 80.0, 110.0, 120.0, 0.9))]
        );
    }

    #[test]
    fn decode_rejects_mismatched_output() {
        assert!(decode_output(&[0.0; 7], &[1, 7, 1], 80, 0.25).is_err());
        assert!(decode_output(&[], &[1, 84, 0], 80, 0.25).is_err());
        // shape fine, but the buffer is short
        assert!(decode_output(&[0.0; 84], &[1, 84, 2], 80, 0.25).is_err());
    }

    #[test]
    fn decode_rejects_single_class_export() {
        // a [1, 5, 8400] export has 42000 values, which is also a multiple of 84
        let anchors = 8400;
        let mut out = vec![0.0; 5 * anchors];
        out[..4 * anchors].fill(320.0);
        out[4 * anchors..].fill(0.9);
        assert_eq!(out.len() % 84, 0);

        let err = decode_output(&out, &[1, 5, anchors as i64], 80, 0.25).unwrap_err();
        assert!(err.to_string().contains("[1, 5, 8400]"));
    }

    #[test]
    fn corrupt_weights_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yolov8m.onnx");
        std::fs::write(&path, b"these bytes are not an onnx graph").unwrap();

        let result = YoloDetector::load(&path, YoloParams::default());
        assert!(matches!(
            result,
            Err(inference_common::Error::ModelLoad { .. })
        ));
    }

    #[test]
    fn preprocess_is_nchw_and_normalized() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            32,
            16,
            image::Rgb([255, 0, 51]),
        ));
        let input = preprocess(&image, 8).unwrap();
        assert_eq!(input.dim(), (1, 3, 8, 8));
        // allow for fixed point rounding in the resizer
        assert!((input[[0, 0, 3, 5]] - 1.0).abs() < 0.01);
        assert!(input[[0, 1, 3, 5]].abs() < 0.01);
        assert!((input[[0, 2, 7, 7]] - 0.2).abs() < 0.01);
    }

    #[test]
    fn missing_weights_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = YoloDetector::load(&dir.path().join("yolov8m.onnx"), YoloParams::default());
        assert!(matches!(
            result,
            Err(inference_common::Error::ModelLoad { .. })
        ));
    }
}
