use std::fmt;

/// What the pipeline is doing, for display in the host UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Starting,
    /// Frames are shown raw until the first usable mask arrives
    WaitingForMask,
    Running,
    /// The last segmentation attempt failed; frames keep flowing with the previous mask
    SegmentationUnavailable(String),
    Stopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Starting => write!(f, "Starting"),
            Status::WaitingForMask => write!(f, "Waiting for mask"),
            Status::Running => write!(f, "Running"),
            Status::SegmentationUnavailable(reason) => {
                write!(f, "Segmentation unavailable, keeping last mask: {}", reason)
            }
            Status::Stopped => write!(f, "Stopped"),
        }
    }
}
