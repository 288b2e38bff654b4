use image::{Rgba, RgbaImage};
use ndarray::Array2;

/// Displayable encoding of a StableAlpha grid: opaque white, alpha carries the mask
#[derive(Debug, Clone, PartialEq)]
pub struct MaskImage {
    image: RgbaImage,
}

impl MaskImage {
    /// Encode an alpha grid in [0, 1] as white RGBA at the same resolution
    pub fn from_alpha(alpha: &Array2<f32>) -> Self {
        let (rows, cols) = alpha.dim();
        let image = RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
            let value = alpha[[y as usize, x as usize]];
            let a = (value * 255.0).round().clamp(0.0, 255.0) as u8;
            Rgba([255, 255, 255, a])
        });
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Mean alpha over the grid, 0.0-1.0
    pub fn coverage(&self) -> f32 {
        let count = self.image.width() as u64 * self.image.height() as u64;
        if count == 0 {
            return 0.0;
        }
        let total: u64 = self.image.pixels().map(|p| p[3] as u64).sum();
        total as f32 / (count as f32 * 255.0)
    }
}
