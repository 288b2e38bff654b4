use anyhow::Result;
use image::RgbImage;
use ndarray::Array2;

/// Class index the hair segmenter uses for hair pixels
pub const HAIR_CLASS: u8 = 1;

/// One segmentation result as handed over by the model
///
/// Grids are stored `(height, width)`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMask {
    /// Per-pixel hair confidence, nominally 0.0-1.0
    Confidence(Array2<f32>),
    /// Per-pixel class index, `HAIR_CLASS` marks hair
    Category(Array2<u8>),
    /// The model answered but gave nothing decodable
    Absent,
}

impl RawMask {
    /// Build a category mask from a float category buffer
    ///
    /// Some runtimes hand category masks back as floats; anything above 0.5
    /// counts as hair.
    pub fn from_category_floats(grid: &Array2<f32>) -> Self {
        RawMask::Category(grid.mapv(|v| if v > 0.5 { HAIR_CLASS } else { 0 }))
    }

    /// Normalize to a hair confidence grid in [0, 1]
    ///
    /// Returns `None` for `Absent`; callers must not invent a mask.
    pub fn normalize(&self) -> Option<Array2<f32>> {
        match self {
            RawMask::Confidence(grid) => Some(grid.mapv(|v| {
                if v.is_nan() {
                    0.0
                } else {
                    v.clamp(0.0, 1.0)
                }
            })),
            RawMask::Category(grid) => {
                Some(grid.mapv(|c| if c == HAIR_CLASS { 1.0 } else { 0.0 }))
            }
            RawMask::Absent => None,
        }
    }

    /// Returns (width, height), or `None` for `Absent`
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (rows, cols) = match self {
            RawMask::Confidence(grid) => grid.dim(),
            RawMask::Category(grid) => grid.dim(),
            RawMask::Absent => return None,
        };
        Some((cols as u32, rows as u32))
    }
}

/// Trait for hair segmentation models
///
/// The model itself lives outside this crate; anything that can turn a frame
/// into a `RawMask` plugs in here.
pub trait SegmentationModel: Send {
    /// Segment a frame at compute resolution
    ///
    /// May block for the duration of inference. The coordinator runs it off
    /// the display path.
    fn segment(&mut self, frame: &RgbImage) -> Result<RawMask>;

    /// Reset internal state (for models with temporal/recurrent components)
    ///
    /// Called when the compute resolution changes.
    fn reset_state(&mut self) {
        // Default implementation: no-op for stateless models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn category_mask_maps_hair_class_only() {
        let raw = RawMask::Category(array![[0, 1], [2, 1]]);
        assert_eq!(raw.normalize().unwrap(), array![[0.0f32, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn confidence_is_clamped_and_nan_dropped() {
        let raw = RawMask::Confidence(array![[-0.5, 0.25], [1.5, f32::NAN]]);
        assert_eq!(raw.normalize().unwrap(), array![[0.0f32, 0.25], [1.0, 0.0]]);
    }

    #[test]
    fn float_categories_binarize_above_half() {
        let raw = RawMask::from_category_floats(&array![[0.5f32, 0.51, 0.0]]);
        assert_eq!(raw, RawMask::Category(array![[0u8, 1, 0]]));
    }

    #[test]
    fn absent_has_no_grid() {
        assert_eq!(RawMask::Absent.normalize(), None);
        assert_eq!(RawMask::Absent.dimensions(), None);
    }

    #[test]
    fn dimensions_are_width_then_height() {
        let raw = RawMask::Confidence(Array2::zeros((3, 5)));
        assert_eq!(raw.dimensions(), Some((5, 3)));
    }
}
