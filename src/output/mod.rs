use anyhow::Result;
use image::RgbImage;

/// Trait for display surfaces
pub trait OutputSink: Send {
    /// Show a composited frame
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;
}
