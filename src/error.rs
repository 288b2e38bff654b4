use thiserror::Error;

/// Failures while turning a segmentation result into a stable alpha grid
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MaskError {
    /// The segmenter produced neither a confidence nor a category grid
    #[error("segmentation result carried no usable mask data")]
    Absent,

    /// Two grids that must line up have different dimensions
    #[error("mask grid is {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// A configuration value outside its accepted range
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("invalid color {0:?}: expected #rrggbb")]
    InvalidColor(String),
}

/// Errors surfaced by the loop coordinator itself
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration")]
    Config(#[from] ConfigError),

    #[error("pipeline task failed")]
    Join(#[from] tokio::task::JoinError),
}
