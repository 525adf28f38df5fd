//! Quality tiers and device capabilities
//!
//! The effective rendering fidelity is one of four ordered tiers. It is the
//! requested tier clamped to what the device can run; the governor in
//! `governor.rs` adds frame-time observation and the uniform update cadence.

mod governor;

pub use governor::*;

use serde::{Deserialize, Serialize};

/// Discrete fidelity bucket, ordered low < medium < high < ultra.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
    Ultra,
}

impl QualityTier {
    /// Interval between time-varying uniform updates
    pub fn update_interval_ms(self) -> u32 {
        match self {
            QualityTier::Low => 100,
            QualityTier::Medium => 33,
            QualityTier::High => 16,
            QualityTier::Ultra => 8,
        }
    }

    /// Edge length of the procedural atlas before device clamping
    pub fn atlas_size(self) -> u32 {
        match self {
            QualityTier::Low => 256,
            QualityTier::Medium => 512,
            QualityTier::High => 1024,
            QualityTier::Ultra => 2048,
        }
    }

    /// The next tier down; `Low` is the floor.
    pub fn lower(self) -> Option<QualityTier> {
        match self {
            QualityTier::Low => None,
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::High => Some(QualityTier::Medium),
            QualityTier::Ultra => Some(QualityTier::High),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
            QualityTier::Ultra => "ultra",
        }
    }

    pub fn from_name(name: &str) -> Option<QualityTier> {
        Self::all().iter().copied().find(|t| t.name() == name)
    }

    pub fn all() -> &'static [QualityTier] {
        &[
            QualityTier::Low,
            QualityTier::Medium,
            QualityTier::High,
            QualityTier::Ultra,
        ]
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fragment shader float precision reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentPrecision {
    Lowp,
    Mediump,
    #[default]
    Highp,
}

/// Device limits captured once per session by an external probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    pub supports_shader_pipeline: bool,
    pub max_texture_size: u32,
    pub fragment_precision: FragmentPrecision,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            supports_shader_pipeline: true,
            max_texture_size: 4096,
            fragment_precision: FragmentPrecision::Highp,
        }
    }
}

impl DeviceCapabilities {
    /// Capabilities of a device without a programmable pipeline
    pub fn minimal() -> Self {
        Self {
            supports_shader_pipeline: false,
            max_texture_size: 1024,
            fragment_precision: FragmentPrecision::Lowp,
        }
    }

    /// Highest tier this device may run.
    pub fn tier_ceiling(&self) -> QualityTier {
        if !self.supports_shader_pipeline {
            QualityTier::Low
        } else if self.max_texture_size < 2048
            || self.fragment_precision == FragmentPrecision::Lowp
        {
            QualityTier::Medium
        } else {
            QualityTier::Ultra
        }
    }
}

/// The fidelity settings the rest of the pipeline follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    pub tier: QualityTier,
    pub update_interval_ms: u32,
    /// Live shader programs may be used (high and ultra only)
    pub allow_shaders: bool,
    pub texture_atlas_size: u32,
}

impl QualityProfile {
    /// Profile for a tier already known to be supported by `capabilities`.
    pub fn for_tier(tier: QualityTier, capabilities: &DeviceCapabilities) -> Self {
        let tier = tier.min(capabilities.tier_ceiling());
        Self {
            tier,
            update_interval_ms: tier.update_interval_ms(),
            allow_shaders: capabilities.supports_shader_pipeline && tier >= QualityTier::High,
            texture_atlas_size: tier.atlas_size().min(capabilities.max_texture_size.max(1)),
        }
    }
}
