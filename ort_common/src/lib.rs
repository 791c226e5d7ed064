pub mod nms;
pub mod yolo;

pub use yolo::{YoloDetector, YoloParams};
