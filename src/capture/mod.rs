use anyhow::Result;
use image::RgbImage;

/// Trait for camera capture sources
///
/// Camera acquisition lives outside this crate; the pipeline only pulls frames.
pub trait CaptureSource: Send {
    /// Capture a single frame at display resolution
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}
