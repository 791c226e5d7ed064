//! Dominant color extraction from bounding box regions.

use image::DynamicImage;
use ndarray::Array2;

use crate::bbox::{Bbox, PixelRegion};
use crate::color::Rgb;
use crate::kmeans::KMeans;
use crate::Error;

/// Crops detected regions and clusters their pixels.
#[derive(Debug, Clone, Default)]
pub struct ColorAnalyzer {
    kmeans: KMeans,
}

impl ColorAnalyzer {
    pub fn new(kmeans: KMeans) -> Self {
        Self { kmeans }
    }

    /// Dominant color of the region under `bbox`: the centroid of the most
    /// populated cluster.
    pub fn dominant_color(&self, image: &DynamicImage, bbox: &Bbox) -> Result<Rgb, Error> {
        let colors = self.dominant_colors(image, bbox)?;
        colors.first().copied().ok_or(Error::EmptyCrop(*bbox))
    }

    /// All cluster centroids of the region, ordered by cluster size.
    pub fn dominant_colors(&self, image: &DynamicImage, bbox: &Bbox) -> Result<Vec<Rgb>, Error> {
        let pixels = crop_pixels(image, bbox).ok_or(Error::EmptyCrop(*bbox))?;
        let clusters = self
            .kmeans
            .fit(pixels.view())
            .ok_or(Error::EmptyCrop(*bbox))?;
        Ok(clusters
            .into_iter()
            .map(|cluster| Rgb::from_f64(cluster.centroid))
            .collect())
    }
}

/// Flattens the pixels under `bbox` into an `(n, 3)` matrix of RGB vectors.
/// `None` when the clipped region is empty.
pub fn crop_pixels(image: &DynamicImage, bbox: &Bbox) -> Option<Array2<f32>> {
    let region = bbox.pixel_region(image.width(), image.height())?;
    let PixelRegion { x1, y1, .. } = region;

    let cropped = image
        .crop_imm(x1, y1, region.width(), region.height())
        .to_rgb8();
    let n = (cropped.width() * cropped.height()) as usize;
    let flat: Vec<f32> = cropped.into_raw().into_iter().map(|c| c as f32).collect();
    Array2::from_shape_vec((n, 3), flat).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmeans::DEFAULT_SEED;
    use image::{Rgb as Px, RgbImage};

    fn two_tone() -> DynamicImage {
        // left half red, right half blue
        let mut img = RgbImage::from_pixel(10, 4, Px([200, 30, 30]));
        for y in 0..4 {
            for x in 5..10 {
                img.put_pixel(x, y, Px([20, 40, 220]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn crop_reshapes_region() {
        let pixels = crop_pixels(&two_tone(), &Bbox::new(4.0, 1.0, 6.0, 3.0, 1.0)).unwrap();
        assert_eq!(pixels.dim(), (4, 3));
        assert_eq!(pixels.row(0).to_vec(), vec![200.0, 30.0, 30.0]);
        assert_eq!(pixels.row(1).to_vec(), vec![20.0, 40.0, 220.0]);
    }

    #[test]
    fn uniform_region_gives_its_color() {
        let analyzer = ColorAnalyzer::default();
        let color = analyzer
            .dominant_color(&two_tone(), &Bbox::new(0.0, 0.0, 5.0, 4.0, 0.8))
            .unwrap();
        assert_eq!(color, Rgb::new(200, 30, 30));
    }

    #[test]
    fn single_cluster_rounds_the_mean() {
        // 5 red columns + 1 blue column => mean (170, 31.67, 61.67)
        let analyzer = ColorAnalyzer::default();
        let color = analyzer
            .dominant_color(&two_tone(), &Bbox::new(0.0, 0.0, 6.0, 4.0, 0.8))
            .unwrap();
        assert_eq!(color, Rgb::new(170, 32, 62));
    }

    #[test]
    fn out_of_bounds_box_is_clipped_first() {
        let analyzer = ColorAnalyzer::default();
        let color = analyzer
            .dominant_color(&two_tone(), &Bbox::new(7.0, -20.0, 50.0, 50.0, 0.8))
            .unwrap();
        assert_eq!(color, Rgb::new(20, 40, 220));
    }

    #[test]
    fn degenerate_box_is_empty_crop() {
        let analyzer = ColorAnalyzer::default();
        for bbox in [
            Bbox::new(3.0, 0.0, 3.0, 4.0, 0.8),
            Bbox::new(0.0, 2.0, 10.0, 2.5, 0.8),
            Bbox::new(11.0, 0.0, 20.0, 4.0, 0.8),
        ] {
            let err = analyzer.dominant_color(&two_tone(), &bbox).unwrap_err();
            assert!(matches!(err, Error::EmptyCrop(b) if b == bbox));
        }
    }

    #[test]
    fn multiple_clusters_largest_first() {
        let analyzer = ColorAnalyzer::new(KMeans::new(2, DEFAULT_SEED));
        // 5 red columns, 3 blue columns
        let colors = analyzer
            .dominant_colors(&two_tone(), &Bbox::new(0.0, 0.0, 8.0, 4.0, 0.8))
            .unwrap();
        assert_eq!(colors, vec![Rgb::new(200, 30, 30), Rgb::new(20, 40, 220)]);
    }
}
