/// Axis-aligned bounding box in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub confidence: f32,
}

/// Integer pixel region, `x2`/`y2` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRegion {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            confidence,
        }
    }

    /// Builds a box from yolo-style center + size.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32, confidence: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0, confidence)
    }

    pub fn width(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.ymax - self.ymin).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn intersection(&self, other: &Bbox) -> f32 {
        let w = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let h = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        w * h
    }

    /// Intersection over union, 0 when both boxes are degenerate.
    pub fn iou(&self, other: &Bbox) -> f32 {
        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(
            self.xmin * sx,
            self.ymin * sy,
            self.xmax * sx,
            self.ymax * sy,
            self.confidence,
        )
    }

    /// Clamps all coordinates into `[0, width] x [0, height]`.
    pub fn clip(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self::new(
            self.xmin.clamp(0.0, w),
            self.ymin.clamp(0.0, h),
            self.xmax.clamp(0.0, w),
            self.ymax.clamp(0.0, h),
            self.confidence,
        )
    }

    /// Pixel region covered by the box once clipped to the image, or `None`
    /// when that region has zero width or height.
    pub fn pixel_region(&self, width: u32, height: u32) -> Option<PixelRegion> {
        let clipped = self.clip(width, height);
        if !clipped.xmin.is_finite()
            || !clipped.ymin.is_finite()
            || !clipped.xmax.is_finite()
            || !clipped.ymax.is_finite()
        {
            return None;
        }

        let region = PixelRegion {
            x1: clipped.xmin as u32,
            y1: clipped.ymin as u32,
            x2: clipped.xmax as u32,
            y2: clipped.ymax as u32,
        };
        if region.x2 <= region.x1 || region.y2 <= region.y1 {
            return None;
        }
        Some(region)
    }
}
