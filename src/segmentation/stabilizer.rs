use super::types::RawMask;
use crate::config::SegmentationConfig;
use crate::error::MaskError;
use ndarray::{Array2, Zip};

/// Multiply every confidence by `gain` and clamp back into [0, 1]
pub fn apply_gain(grid: &mut Array2<f32>, gain: f32) {
    grid.mapv_inplace(|v| (v * gain).clamp(0.0, 1.0));
}

/// Zero every value below `thresh`; a value equal to `thresh` survives
pub fn apply_threshold(grid: &mut Array2<f32>, thresh: f32) {
    grid.mapv_inplace(|v| if v >= thresh { v } else { 0.0 });
}

/// Exponential moving average: `current = alpha * current + (1 - alpha) * previous`
pub fn blend_ema(
    current: &mut Array2<f32>,
    previous: &Array2<f32>,
    alpha: f32,
) -> Result<(), MaskError> {
    if current.dim() != previous.dim() {
        return Err(MaskError::ShapeMismatch {
            expected: current.dim(),
            actual: previous.dim(),
        });
    }

    let keep = 1.0 - alpha;
    Zip::from(current).and(previous).for_each(|cur, &prev| {
        *cur = (alpha * *cur + keep * prev).clamp(0.0, 1.0);
    });
    Ok(())
}

/// 3x3 mean filter, samples outside the grid count as zero
pub fn box_blur_3x3(grid: &Array2<f32>) -> Array2<f32> {
    let (rows, cols) = grid.dim();
    let mut out = Array2::<f32>::zeros((rows, cols));

    for y in 0..rows {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(rows - 1);
        for x in 0..cols {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(cols - 1);

            let mut sum = 0.0f32;
            for yy in y0..=y1 {
                for xx in x0..=x1 {
                    sum += grid[[yy, xx]];
                }
            }
            // Always divide by the full window; missing neighbours are zero padding
            out[[y, x]] = (sum / 9.0).clamp(0.0, 1.0);
        }
    }

    out
}

/// Turn one normalized confidence grid into a smoothed alpha grid
///
/// Steps:
/// 1. Gain, clamp, hard threshold
/// 2. Temporal blend with `previous` (skipped when absent or a different size)
/// 3. Optional 3x3 blur followed by a second threshold
///
/// Pure: identical inputs always give bit-identical output.
pub fn stabilize(
    raw: &Array2<f32>,
    previous: Option<&Array2<f32>>,
    config: &SegmentationConfig,
) -> Array2<f32> {
    let _span = tracing::debug_span!("stabilize").entered();

    let mut alpha = raw.clone();
    apply_gain(&mut alpha, config.gain);
    apply_threshold(&mut alpha, config.thresh);

    if let Some(previous) = previous {
        if blend_ema(&mut alpha, previous, config.ema_alpha).is_err() {
            tracing::debug!(
                "Previous alpha is {:?}, current is {:?}; skipping temporal blend",
                previous.dim(),
                alpha.dim()
            );
        }
    }

    if config.blur_enabled {
        alpha = box_blur_3x3(&alpha);
        apply_threshold(&mut alpha, config.thresh);
    }

    alpha
}

/// Owns the StableAlpha history between segmentation ticks
#[derive(Debug, Default)]
pub struct MaskStabilizer {
    history: Option<Array2<f32>>,
    last_update_reset: bool,
}

impl MaskStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a new segmentation result into the history
    ///
    /// `Absent` leaves the history untouched and reports `MaskError::Absent`.
    /// A grid whose size differs from the history starts a fresh history.
    pub fn update(
        &mut self,
        raw: &RawMask,
        config: &SegmentationConfig,
    ) -> Result<&Array2<f32>, MaskError> {
        self.last_update_reset = false;
        let current = raw.normalize().ok_or(MaskError::Absent)?;

        if let Some(history) = &self.history {
            if history.dim() != current.dim() {
                tracing::debug!(
                    "Mask grid changed from {:?} to {:?}, discarding history",
                    history.dim(),
                    current.dim()
                );
                self.history = None;
                self.last_update_reset = true;
            }
        }

        let next = stabilize(&current, self.history.as_ref(), config);
        Ok(&*self.history.insert(next))
    }

    /// Whether the most recent `update` had to discard history
    pub fn last_update_reset(&self) -> bool {
        self.last_update_reset
    }

    /// Current StableAlpha, if any tick has produced one
    pub fn history(&self) -> Option<&Array2<f32>> {
        self.history.as_ref()
    }

    /// Drop history so the next update starts unblended
    pub fn reset(&mut self) {
        self.history = None;
    }
}
