//! Compositor settings
//!
//! Persisted as XML in the user config directory
//! (`<config_dir>/foilcard/settings.xml`). Missing elements take their
//! defaults so older files keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::quality::{GovernorConfig, QualityTier, DEFAULT_DOWNGRADE_WINDOW, DEFAULT_FRAME_BUDGET_MS};
use crate::telemetry::LogConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "FoilcardSettings")]
pub struct CompositorSettings {
    /// Tier the host asks for; clamped to the device ceiling at runtime
    #[serde(rename = "requestedTier", default)]
    pub requested_tier: QualityTier,

    /// Frame overlay name from the frame catalog ("none" for no frame)
    #[serde(rename = "frameName", default = "default_frame_name")]
    pub frame_name: String,

    #[serde(rename = "frameBudgetMs", default = "default_frame_budget_ms")]
    pub frame_budget_ms: f64,

    /// Frames a slowdown must persist before a downgrade is recommended
    #[serde(rename = "downgradeWindowFrames", default = "default_downgrade_window")]
    pub downgrade_window_frames: usize,

    #[serde(rename = "shaderHotReload", default)]
    pub shader_hot_reload: bool,

    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String,
}

fn default_frame_name() -> String {
    "none".to_string()
}

fn default_frame_budget_ms() -> f64 {
    DEFAULT_FRAME_BUDGET_MS
}

fn default_downgrade_window() -> usize {
    DEFAULT_DOWNGRADE_WINDOW
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            requested_tier: QualityTier::default(),
            frame_name: default_frame_name(),
            frame_budget_ms: default_frame_budget_ms(),
            downgrade_window_frames: default_downgrade_window(),
            shader_hot_reload: false,
            log_level: default_log_level(),
        }
    }
}

impl CompositorSettings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("foilcard");
            p.push("settings.xml");
            p
        })
    }

    /// Load settings from an XML file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let mut settings: Self = from_str(&contents)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save settings to an XML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let xml = to_string(self)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
        fs::write(path, formatted)?;
        Ok(())
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    target: "foilcard::settings",
                    path = %path.display(),
                    error = %e,
                    "Failed to load settings, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save to the default location
    pub fn save_default(&self) -> Result<(), SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        self.save(&path)
    }

    /// Governor tunables from these settings
    pub fn governor_config(&self) -> GovernorConfig {
        GovernorConfig {
            frame_budget_ms: self.frame_budget_ms,
            window_frames: self.downgrade_window_frames,
        }
    }

    /// Console logging at the configured level
    pub fn log_config(&self) -> LogConfig {
        LogConfig::with_level(self.log_level.clone())
    }

    fn sanitize(&mut self) {
        if !self.frame_budget_ms.is_finite() || self.frame_budget_ms <= 0.0 {
            self.frame_budget_ms = DEFAULT_FRAME_BUDGET_MS;
        }
        self.downgrade_window_frames = self.downgrade_window_frames.max(1);
        if self.frame_name.trim().is_empty() {
            self.frame_name = default_frame_name();
        }
    }
}
