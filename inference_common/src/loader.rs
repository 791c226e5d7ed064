use std::path::Path;

use image::DynamicImage;

use crate::Error;

/// Reads and decodes an image file, normalized to 8-bit RGB.
pub fn load_image(path: &Path) -> Result<DynamicImage, Error> {
    let image = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Loaded {:?}: {}x{} {:?}",
        path,
        image.width(),
        image.height(),
        image.color()
    );
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
