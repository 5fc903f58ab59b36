use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for loop events.
///
/// Keeps the loop controller free of output concerns: the binaries log to
/// the console, tests discard everything.
pub trait PipelineLogger: Send {
    /// Report that frame `current` was processed. `total` is 0 for live
    /// sources and unknown lengths.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. detections per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate; the loop may run for hours, so samples aren't kept.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl Stats {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Console logger that aggregates per-stage timing and metrics and prints a
/// summary when the loop ends.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct ConsolePipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Stats>,
    metrics: HashMap<String, Stats>,
    start_time: Instant,
    frames: usize,
}

impl ConsolePipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Pipeline summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stats) in stages {
            let avg_ms = stats.mean();
            let max_ms = stats.max;
            let pct = if elapsed_ms > 0.0 {
                stats.total / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  ({pct:4.1}%)"
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, stats) in metrics {
            lines.push(format!("  {name}: avg {:.2}  max {:.0}", stats.mean(), stats.max));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stats(&self, stage: &str) -> Option<Stats> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stats(&self, name: &str) -> Option<Stats> {
        self.metrics.get(name).copied()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Default for ConsolePipelineLogger {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PipelineLogger for ConsolePipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = self.frames.max(current);
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Processing: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
