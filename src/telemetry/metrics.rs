//! Frame timing statistics
//!
//! Keeps a bounded window of observed frame times for the quality governor
//! and for host overlays.

use std::collections::VecDeque;
use std::time::Instant;

/// Frame timing statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Average frame time in milliseconds
    pub avg_ms: f64,
    /// Minimum frame time in milliseconds
    pub min_ms: f64,
    /// Maximum frame time in milliseconds
    pub max_ms: f64,
    /// 95th percentile frame time
    pub p95_ms: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

/// Sliding window of frame durations (milliseconds).
#[derive(Debug, Clone)]
pub struct FrameTimeWindow {
    samples: VecDeque<f64>,
    capacity: usize,
    sum: f64,
}

impl FrameTimeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Record one frame time. Non-finite or negative samples are dropped.
    pub fn push(&mut self, frame_ms: f64) {
        if !frame_ms.is_finite() || frame_ms < 0.0 {
            return;
        }
        self.samples.push_back(frame_ms);
        self.sum += frame_ms;
        if self.samples.len() > self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
            }
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean_ms(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum / self.samples.len() as f64
        }
    }

    pub fn stats(&self) -> FrameStats {
        if self.samples.is_empty() {
            return FrameStats::default();
        }

        let mut times: Vec<f64> = self.samples.iter().copied().collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        FrameStats {
            avg_ms: self.mean_ms(),
            min_ms: times.first().copied().unwrap_or(0.0),
            max_ms: times.last().copied().unwrap_or(0.0),
            p95_ms: percentile(&times, 0.95),
            sample_count: times.len(),
        }
    }
}

/// Measures wall-clock frame durations for hosts that do not time their
/// own loop.
pub struct FrameProfiler {
    last_frame_start: Option<Instant>,
}

impl Default for FrameProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProfiler {
    pub fn new() -> Self {
        Self {
            last_frame_start: None,
        }
    }

    /// Mark the beginning of a frame, returning the previous frame's
    /// duration in milliseconds.
    pub fn begin_frame(&mut self) -> Option<f64> {
        let now = Instant::now();
        let elapsed = self
            .last_frame_start
            .map(|start| now.duration_since(start).as_secs_f64() * 1000.0);
        self.last_frame_start = Some(now);
        elapsed
    }
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx]
}
