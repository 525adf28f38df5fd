//! Quality governor and uniform update clock
//!
//! The governor owns the effective quality profile for a session. It clamps
//! the requested tier to the device ceiling and watches frame times. When
//! frames stay over budget it *reports* a downgrade recommendation; it never
//! lowers the tier on its own. The host decides whether to act on it.

use serde::{Deserialize, Serialize};

use super::{DeviceCapabilities, QualityProfile, QualityTier};
use crate::telemetry::{FrameStats, FrameTimeWindow};

/// Default frame budget (one 60 Hz frame)
pub const DEFAULT_FRAME_BUDGET_MS: f64 = 16.0;

/// Default number of frames a slowdown must persist for
pub const DEFAULT_DOWNGRADE_WINDOW: usize = 60;

/// Advisory signal emitted when frames are consistently over budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowngradeRecommendation {
    pub from: QualityTier,
    pub to: QualityTier,
    pub mean_frame_ms: f64,
    pub window_frames: usize,
}

/// Tunables for the governor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorConfig {
    pub frame_budget_ms: f64,
    pub window_frames: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            window_frames: DEFAULT_DOWNGRADE_WINDOW,
        }
    }
}

/// Picks the effective quality profile and observes frame times.
pub struct QualityGovernor {
    capabilities: DeviceCapabilities,
    requested: QualityTier,
    profile: QualityProfile,
    config: GovernorConfig,
    window: FrameTimeWindow,
    /// A recommendation was already reported for the current slowdown
    recommended: bool,
}

impl QualityGovernor {
    pub fn new(capabilities: DeviceCapabilities, requested: QualityTier, config: GovernorConfig) -> Self {
        let profile = Self::select(&capabilities, requested, 0.0);
        Self::log_selection(&capabilities, requested, &profile);

        Self {
            capabilities,
            requested,
            profile,
            config,
            window: FrameTimeWindow::new(config.window_frames),
            recommended: false,
        }
    }

    /// Select the profile for a device and requested tier.
    ///
    /// `observed_frame_ms` is advisory only: a sample over the default
    /// budget is logged but never changes the tier. Sustained slowdowns are
    /// reported through [`QualityGovernor::observe_frame`].
    pub fn select(
        capabilities: &DeviceCapabilities,
        requested: QualityTier,
        observed_frame_ms: f64,
    ) -> QualityProfile {
        let profile = QualityProfile::for_tier(requested, capabilities);
        if observed_frame_ms > DEFAULT_FRAME_BUDGET_MS && profile.tier > QualityTier::Low {
            tracing::debug!(
                target: "foilcard::quality",
                tier = %profile.tier,
                observed_frame_ms,
                budget_ms = DEFAULT_FRAME_BUDGET_MS,
                "Selected tier while over frame budget"
            );
        }
        profile
    }

    pub fn profile(&self) -> QualityProfile {
        self.profile
    }

    pub fn tier(&self) -> QualityTier {
        self.profile.tier
    }

    pub fn requested_tier(&self) -> QualityTier {
        self.requested
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Change the requested tier. Returns true when the effective tier
    /// changed.
    pub fn set_requested_tier(&mut self, requested: QualityTier) -> bool {
        self.requested = requested;
        let profile = Self::select(&self.capabilities, requested, self.window.mean_ms());
        let changed = profile.tier != self.profile.tier;
        if changed {
            Self::log_selection(&self.capabilities, requested, &profile);
            self.window.clear();
            self.recommended = false;
        }
        self.profile = profile;
        changed
    }

    /// Record a frame time and report a downgrade recommendation when the
    /// window is full, its mean is over budget and the tier is above low.
    ///
    /// A recommendation fires once per slowdown; it re-arms when the mean
    /// drops back under budget or the tier changes.
    pub fn observe_frame(&mut self, frame_ms: f64) -> Option<DowngradeRecommendation> {
        self.window.push(frame_ms);
        let mean = self.window.mean_ms();

        if mean <= self.config.frame_budget_ms {
            self.recommended = false;
            return None;
        }
        if self.recommended || !self.window.is_full() {
            return None;
        }

        let to = self.profile.tier.lower()?;
        self.recommended = true;
        let recommendation = DowngradeRecommendation {
            from: self.profile.tier,
            to,
            mean_frame_ms: mean,
            window_frames: self.window.len(),
        };
        tracing::warn!(
            target: "foilcard::quality",
            from = %recommendation.from,
            to = %recommendation.to,
            mean_frame_ms = mean,
            budget_ms = self.config.frame_budget_ms,
            "Frame time over budget, recommending lower quality tier"
        );
        Some(recommendation)
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.window.stats()
    }

    fn log_selection(capabilities: &DeviceCapabilities, requested: QualityTier, profile: &QualityProfile) {
        if profile.tier < requested {
            tracing::info!(
                target: "foilcard::quality",
                requested = %requested,
                effective = %profile.tier,
                ceiling = %capabilities.tier_ceiling(),
                "Requested quality tier clamped to device capability"
            );
        } else {
            tracing::debug!(
                target: "foilcard::quality",
                effective = %profile.tier,
                "Quality tier selected"
            );
        }
    }
}

/// Throttles time-varying uniforms to the profile's update interval.
///
/// Rendering itself is not capped; between ticks the previous `time` value
/// is reused.
#[derive(Debug, Clone)]
pub struct UniformClock {
    interval_ms: u32,
    last_tick_ms: Option<f64>,
    time: f32,
}

impl UniformClock {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_tick_ms: None,
            time: 0.0,
        }
    }

    /// Advance with the milliseconds elapsed since session start. Returns
    /// true when the interval elapsed and the uniform time was updated.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let due = match self.last_tick_ms {
            None => true,
            Some(last) => now_ms - last >= self.interval_ms as f64,
        };
        if due {
            self.last_tick_ms = Some(now_ms);
            self.time = (now_ms / 1000.0) as f32;
        }
        due
    }

    /// Seconds since session start as of the last tick
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::FragmentPrecision;

    fn config(window: usize) -> GovernorConfig {
        GovernorConfig {
            frame_budget_ms: 16.0,
            window_frames: window,
        }
    }

    #[test]
    fn test_select_clamps_to_ceiling() {
        let no_shaders = DeviceCapabilities {
            supports_shader_pipeline: false,
            ..DeviceCapabilities::default()
        };
        for tier in QualityTier::all() {
            let profile = QualityGovernor::select(&no_shaders, *tier, 0.0);
            assert_eq!(profile.tier, QualityTier::Low);
        }

        let lowp = DeviceCapabilities {
            fragment_precision: FragmentPrecision::Lowp,
            ..DeviceCapabilities::default()
        };
        assert_eq!(QualityGovernor::select(&lowp, QualityTier::Ultra, 0.0).tier, QualityTier::Medium);
        assert_eq!(QualityGovernor::select(&lowp, QualityTier::Low, 0.0).tier, QualityTier::Low);
    }

    #[test]
    fn test_select_ignores_frame_time() {
        let caps = DeviceCapabilities::default();
        let fast = QualityGovernor::select(&caps, QualityTier::Ultra, 4.0);
        let slow = QualityGovernor::select(&caps, QualityTier::Ultra, 80.0);
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_recommendation_requires_full_window() {
        let mut governor = QualityGovernor::new(DeviceCapabilities::default(), QualityTier::Ultra, config(5));
        for _ in 0..4 {
            assert!(governor.observe_frame(30.0).is_none());
        }
        let rec = governor.observe_frame(30.0).unwrap();
        assert_eq!(rec.from, QualityTier::Ultra);
        assert_eq!(rec.to, QualityTier::High);
        assert!((rec.mean_frame_ms - 30.0).abs() < 1e-9);
        // The tier itself is untouched
        assert_eq!(governor.tier(), QualityTier::Ultra);
    }

    #[test]
    fn test_recommendation_fires_once_then_rearms() {
        let mut governor = QualityGovernor::new(DeviceCapabilities::default(), QualityTier::High, config(3));
        let fired: Vec<_> = (0..10).filter_map(|_| governor.observe_frame(25.0)).collect();
        assert_eq!(fired.len(), 1);

        // Recover under budget, then slow down again
        for _ in 0..3 {
            assert!(governor.observe_frame(5.0).is_none());
        }
        let fired_again: Vec<_> = (0..10).filter_map(|_| governor.observe_frame(25.0)).collect();
        assert_eq!(fired_again.len(), 1);
    }

    #[test]
    fn test_no_recommendation_at_floor() {
        let mut governor = QualityGovernor::new(DeviceCapabilities::minimal(), QualityTier::Ultra, config(2));
        assert_eq!(governor.tier(), QualityTier::Low);
        for _ in 0..10 {
            assert!(governor.observe_frame(100.0).is_none());
        }
    }

    #[test]
    fn test_short_spike_ignored() {
        let mut governor = QualityGovernor::new(DeviceCapabilities::default(), QualityTier::High, config(10));
        for _ in 0..9 {
            governor.observe_frame(8.0);
        }
        assert!(governor.observe_frame(40.0).is_none());
    }

    #[test]
    fn test_set_requested_tier() {
        let mut governor = QualityGovernor::new(DeviceCapabilities::default(), QualityTier::Ultra, config(3));
        assert!(governor.set_requested_tier(QualityTier::Medium));
        assert_eq!(governor.profile().update_interval_ms, 33);
        assert!(!governor.set_requested_tier(QualityTier::Medium));
    }

    #[test]
    fn test_uniform_clock_throttles() {
        let mut clock = UniformClock::new(QualityTier::Medium.update_interval_ms());
        assert!(clock.tick(0.0));
        assert!(!clock.tick(16.0));
        assert_eq!(clock.time(), 0.0);
        assert!(clock.tick(33.0));
        assert!((clock.time() - 0.033).abs() < 1e-6);
        assert!(!clock.tick(50.0));
        assert!((clock.time() - 0.033).abs() < 1e-6);
    }
}
