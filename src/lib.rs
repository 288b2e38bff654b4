//! Live hair recoloring for camera feeds.
//!
//! A segmentation model (supplied by the host) marks hair pixels at a reduced
//! compute resolution. The [`segmentation::MaskStabilizer`] smooths those masks
//! over time, the [`compose`] stage paints a color into the masked region
//! while keeping strand texture, and [`pipeline::start`] runs both at their own
//! rates.

pub mod capture;
pub mod compose;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use capture::CaptureSource;
pub use config::{Color, ColorSpec, PipelineConfig, SegmentationConfig, TintConfig, ToneAdjust};
pub use error::{ConfigError, MaskError, PipelineError};
pub use output::OutputSink;
pub use pipeline::{PipelineHandle, Status};
pub use segmentation::{MaskImage, RawMask, SegmentationModel};
