pub mod bbox;
pub mod coco_classes;
pub mod color;
pub mod color_extractor;
pub mod detector;
pub mod error;
pub mod kmeans;
pub mod loader;
pub mod similar_colors;

pub use error::Error;
