use crate::common::*;
use image::imageops::FilterType;

/// A fixed-ratio image pyramid reduction.
///
/// A pyramid of rate `N` scales the frame by `(N-1)/N`: rate 2 halves the
/// image, rate 3 takes it to two thirds. [`Self::rect_down`] and
/// [`Self::point_down`] map original-frame coordinates into the reduced
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidDown {
    rate: u32,
}

impl PyramidDown {
    /// Panics when `rate < 2`.
    pub fn new(rate: u32) -> Self {
        assert!(rate >= 2, "pyramid rate must be at least 2");
        Self { rate }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// The per-axis scale factor, `(rate - 1) / rate`.
    pub fn scale(&self) -> f64 {
        (self.rate - 1) as f64 / self.rate as f64
    }

    pub fn downsample(&self, image: &DynamicImage) -> DynamicImage {
        let scale = self.scale();
        let width = (image.width() as f64 * scale).round().max(1.0) as u32;
        let height = (image.height() as f64 * scale).round().max(1.0) as u32;
        image.resize_exact(width, height, FilterType::Triangle)
    }

    fn coord_transform(&self) -> Transform<R64> {
        let rate = r64(self.rate as f64);
        let scaled = rate - r64(1.0);
        Transform::from_sizes_exact([rate, rate], [scaled, scaled])
    }

    pub fn rect_down(&self, rect: &Rect<R64>) -> Rect<R64> {
        &self.coord_transform() * rect
    }

    pub fn point_down(&self, point: &Point<R64>) -> Point<R64> {
        &self.coord_transform() * point
    }
}
