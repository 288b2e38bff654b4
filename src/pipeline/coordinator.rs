use super::slot::MaskSlot;
use super::stats::FrameStats;
use super::status::Status;
use crate::capture::CaptureSource;
use crate::compose::Compositor;
use crate::config::PipelineConfig;
use crate::error::{ConfigError, MaskError, PipelineError};
use crate::output::OutputSink;
use crate::segmentation::{MaskImage, MaskStabilizer, Preprocessor, RawMask, SegmentationModel};
use anyhow::anyhow;
use image::RgbImage;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What comes back from a segmentation worker
struct SegmentationOutcome<M> {
    model: M,
    result: anyhow::Result<RawMask>,
    elapsed: Duration,
}

/// Start both schedules on the current tokio runtime
///
/// The display schedule composites at `display_fps` with whatever mask is
/// current; the segmentation schedule runs the model at `seg_fps` on a
/// blocking worker and publishes stabilized masks.
pub fn start<C, M, O>(
    capture: C,
    model: M,
    output: O,
    config: PipelineConfig,
) -> Result<PipelineHandle, PipelineError>
where
    C: CaptureSource + 'static,
    M: SegmentationModel + 'static,
    O: OutputSink + 'static,
{
    config.validate()?;

    let (width, height) = capture.resolution();
    tracing::info!("Capture: {}x{}", width, height);
    tracing::info!(
        "Starting pipeline: display {} fps, segmentation {} fps at scale {}",
        config.display_fps,
        config.segmentation.seg_fps,
        config.segmentation.seg_scale
    );

    let cancel = CancellationToken::new();
    let (config_tx, config_rx) = watch::channel(config);
    let (status_tx, status_rx) = watch::channel(Status::Starting);
    let slot = MaskSlot::new();
    let masks = slot.subscribe();

    let coordinator = Coordinator {
        capture,
        model: Some(model),
        output,
        config,
        stabilizer: MaskStabilizer::new(),
        compositor: Compositor::new(),
        slot,
        status: status_tx,
        latest_frame: None,
        last_output: None,
        compute_size: None,
        stats: FrameStats::default(),
    };

    let task = tokio::spawn(coordinator.run(cancel.clone(), config_rx));

    Ok(PipelineHandle {
        cancel,
        task: Some(task),
        config: config_tx,
        status: status_rx,
        masks,
    })
}

/// Control surface for a running pipeline
///
/// Dropping the handle cancels both schedules.
pub struct PipelineHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<Option<RgbImage>>>,
    config: watch::Sender<PipelineConfig>,
    status: watch::Receiver<Status>,
    masks: watch::Receiver<Option<Arc<MaskImage>>>,
}

impl PipelineHandle {
    /// Cancel both schedules and wait for the loop to wind down
    ///
    /// Returns the last frame that was displayed, for snapshots. A segmentation
    /// still in flight is discarded.
    pub async fn stop(mut self) -> Result<Option<RgbImage>, PipelineError> {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(None),
        }
    }

    /// Swap in a new configuration; takes effect on the next tick
    pub fn update_config(&self, config: PipelineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config.send_replace(config);
        Ok(())
    }

    pub fn config(&self) -> PipelineConfig {
        *self.config.borrow()
    }

    pub fn status(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    pub fn masks(&self) -> watch::Receiver<Option<Arc<MaskImage>>> {
        self.masks.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Coordinator<C, M, O> {
    capture: C,
    /// `None` while the model is out on a segmentation worker
    model: Option<M>,
    output: O,
    config: PipelineConfig,
    stabilizer: MaskStabilizer,
    compositor: Compositor,
    slot: MaskSlot,
    status: watch::Sender<Status>,
    latest_frame: Option<Arc<RgbImage>>,
    last_output: Option<RgbImage>,
    compute_size: Option<(u32, u32)>,
    stats: FrameStats,
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

async fn join_in_flight<T>(task: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

impl<C, M, O> Coordinator<C, M, O>
where
    C: CaptureSource + 'static,
    M: SegmentationModel + 'static,
    O: OutputSink + 'static,
{
    async fn run(
        mut self,
        cancel: CancellationToken,
        mut config_rx: watch::Receiver<PipelineConfig>,
    ) -> Option<RgbImage> {
        let mut display = ticker(self.config.display_interval());
        let mut segmentation = ticker(self.config.segmentation.tick_interval());
        let mut in_flight: Option<JoinHandle<SegmentationOutcome<M>>> = None;

        self.set_status(Status::WaitingForMask);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                changed = config_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let config = *config_rx.borrow_and_update();
                    if config.display_fps != self.config.display_fps {
                        display = ticker(config.display_interval());
                    }
                    if config.segmentation.seg_fps != self.config.segmentation.seg_fps {
                        segmentation = ticker(config.segmentation.tick_interval());
                    }
                    tracing::debug!("Configuration updated: {:?}", config);
                    self.config = config;
                }

                joined = join_in_flight(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    self.finish_segmentation(joined);
                }

                _ = display.tick() => self.display_tick(),

                _ = segmentation.tick(), if in_flight.is_none() => {
                    in_flight = self.start_segmentation();
                }
            }
        }

        if in_flight.is_some() {
            tracing::debug!("Discarding in-flight segmentation after stop");
        }
        self.set_status(Status::Stopped);
        tracing::info!(
            "Pipeline stopped after {} frames, {} masks",
            self.stats.frame_count(),
            self.stats.segment_count()
        );

        self.last_output
    }

    fn set_status(&self, status: Status) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                tracing::debug!("Status: {}", status);
                *current = status;
                true
            }
        });
    }

    fn display_tick(&mut self) {
        let capture_start = Instant::now();
        let frame = match self.capture.capture_frame() {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                tracing::warn!("Failed to capture frame: {:#}", e);
                // Keep the last good frame on screen, without recoloring
                if let Some(frame) = &self.latest_frame {
                    if let Err(e) = self.output.write_frame(frame) {
                        tracing::warn!("Failed to write frame: {:#}", e);
                    }
                }
                return;
            }
        };
        let capture_time = capture_start.elapsed();
        self.latest_frame = Some(Arc::clone(&frame));

        let composite_start = Instant::now();
        let mask = self.slot.latest();
        let composed = self
            .compositor
            .composite(&frame, mask.as_ref(), &self.config.tint);
        let composite_time = composite_start.elapsed();

        let output_start = Instant::now();
        if let Err(e) = self.output.write_frame(&composed) {
            tracing::warn!("Failed to write frame: {:#}", e);
        }
        let output_time = output_start.elapsed();

        self.last_output = Some(composed);
        self.stats
            .record_frame(capture_time, composite_time, output_time);
    }

    fn start_segmentation(&mut self) -> Option<JoinHandle<SegmentationOutcome<M>>> {
        let frame = self.latest_frame.clone()?;
        let mut model = self.model.take()?;

        let preprocessor = Preprocessor::new(self.config.segmentation.seg_scale);
        let size = preprocessor.target_size(&frame);
        if self.compute_size != Some(size) {
            if let Some(previous) = self.compute_size {
                tracing::info!(
                    "Compute resolution changed from {}x{} to {}x{}, resetting mask history",
                    previous.0,
                    previous.1,
                    size.0,
                    size.1
                );
                self.slot.clear();
            }
            self.stabilizer.reset();
            model.reset_state();
            self.compute_size = Some(size);
        }

        Some(tokio::task::spawn_blocking(move || {
            let _span = tracing::debug_span!("segment").entered();
            let started = Instant::now();
            let small = preprocessor.downsample(&frame);
            let result = panic::catch_unwind(AssertUnwindSafe(|| model.segment(&small)))
                .unwrap_or_else(|payload| {
                    Err(anyhow!("model panicked: {}", panic_message(&*payload)))
                });
            SegmentationOutcome {
                model,
                result,
                elapsed: started.elapsed(),
            }
        }))
    }

    fn finish_segmentation(&mut self, joined: Result<SegmentationOutcome<M>, JoinError>) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                // Model panics are caught in the worker, so only a cancelled or
                // aborted worker lands here and the model is gone with it
                tracing::error!("Segmentation worker failed, disabling segmentation: {}", e);
                self.set_status(Status::SegmentationUnavailable(e.to_string()));
                return;
            }
        };

        self.model = Some(outcome.model);
        self.stats.record_segment(outcome.elapsed);

        let raw = match outcome.result {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Segmentation failed: {:#}", e);
                self.set_status(Status::SegmentationUnavailable(format!("{:#}", e)));
                return;
            }
        };

        match self.stabilizer.update(&raw, &self.config.segmentation) {
            Ok(alpha) => {
                let mask = MaskImage::from_alpha(alpha);
                tracing::debug!(
                    "Publishing {}x{} mask, coverage {:.3}",
                    mask.dimensions().0,
                    mask.dimensions().1,
                    mask.coverage()
                );
                self.slot.publish(mask);
                self.set_status(Status::Running);
            }
            Err(MaskError::Absent) => {
                tracing::debug!("Segmenter returned no mask data");
                if self.slot.latest().is_none() {
                    self.set_status(Status::WaitingForMask);
                }
            }
            Err(e) => {
                tracing::warn!("Discarding segmentation result: {}", e);
            }
        }
    }
}
