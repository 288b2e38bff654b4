use std::time::Duration;

/// Log averages every this many display frames
const REPORT_EVERY: u64 = 30;

/// Running timings for the two schedules
#[derive(Debug, Default)]
pub struct FrameStats {
    frame_count: u64,
    total_capture_time: Duration,
    total_composite_time: Duration,
    total_output_time: Duration,
    segment_count: u64,
    total_segment_time: Duration,
}

impl FrameStats {
    pub fn record_frame(&mut self, capture: Duration, composite: Duration, output: Duration) {
        self.frame_count += 1;
        self.total_capture_time += capture;
        self.total_composite_time += composite;
        self.total_output_time += output;

        if self.frame_count % REPORT_EVERY == 0 {
            self.report();
        }
    }

    pub fn record_segment(&mut self, elapsed: Duration) {
        self.segment_count += 1;
        self.total_segment_time += elapsed;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn segment_count(&self) -> u64 {
        self.segment_count
    }

    fn report(&self) {
        let frames = self.frame_count as f64;
        let avg_capture_ms = self.total_capture_time.as_secs_f64() * 1000.0 / frames;
        let avg_composite_ms = self.total_composite_time.as_secs_f64() * 1000.0 / frames;
        let avg_output_ms = self.total_output_time.as_secs_f64() * 1000.0 / frames;
        let avg_segment_ms = if self.segment_count > 0 {
            self.total_segment_time.as_secs_f64() * 1000.0 / self.segment_count as f64
        } else {
            0.0
        };

        tracing::info!(
            "Frame {}: capture={:.1}ms, composite={:.1}ms, output={:.1}ms, segment={:.1}ms ({} masks)",
            self.frame_count,
            avg_capture_ms,
            avg_composite_ms,
            avg_output_ms,
            avg_segment_ms,
            self.segment_count
        );
    }
}
