use image::{imageops, RgbImage};

/// Shrinks display frames to the compute resolution the segmenter runs at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    scale: f32,
}

impl Preprocessor {
    /// `scale` is the compute resolution as a fraction of the frame, in (0, 1]
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    /// Compute-resolution size for a frame, never smaller than 1x1
    pub fn compute_size(frame_width: u32, frame_height: u32, scale: f32) -> (u32, u32) {
        let scale = if scale.is_finite() {
            scale.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let scaled = |v: u32| ((v as f32 * scale).round() as u32).clamp(1, v.max(1));
        (scaled(frame_width), scaled(frame_height))
    }

    /// Target size for this preprocessor's scale
    pub fn target_size(&self, frame: &RgbImage) -> (u32, u32) {
        let (width, height) = frame.dimensions();
        Self::compute_size(width, height, self.scale)
    }

    /// Resize a frame to compute resolution with bilinear filtering
    ///
    /// Frames already at the target size are returned as a plain copy.
    pub fn downsample(&self, frame: &RgbImage) -> RgbImage {
        let _span = tracing::debug_span!("downsample").entered();

        let (width, height) = self.target_size(frame);
        if frame.dimensions() == (width, height) {
            return frame.clone();
        }

        imageops::resize(frame, width, height, imageops::FilterType::Triangle)
    }
}
