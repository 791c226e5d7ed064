use std::path::PathBuf;

use crate::bbox::Bbox;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input image missing or not decodable. Fatal.
    #[error("unable to read image {path:?}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Detection model weights missing or unusable. Fatal.
    #[error("unable to load detection model {path:?}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    /// Box collapsed to nothing after clipping; the object is skipped.
    #[error("bounding box {0:?} has no pixels inside the image")]
    EmptyCrop(Bbox),
}
