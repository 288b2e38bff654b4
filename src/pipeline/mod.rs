mod coordinator;
mod slot;
mod stats;
mod status;

pub use coordinator::{start, PipelineHandle};
pub use slot::MaskSlot;
pub use stats::FrameStats;
pub use status::Status;
