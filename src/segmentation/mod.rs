mod mask_image;
mod preprocess;
pub mod stabilizer;
pub mod types;

pub use mask_image::MaskImage;
pub use preprocess::Preprocessor;
pub use stabilizer::{stabilize, MaskStabilizer};
pub use types::{RawMask, SegmentationModel, HAIR_CLASS};
