//! Telemetry and logging infrastructure
//!
//! Provides structured logging with tracing and frame-time statistics.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogFormat, LogGuard};
pub use metrics::{FrameProfiler, FrameStats, FrameTimeWindow};
