//! Layer types for the compositor
//!
//! An [`EffectLayer`] is one active optical effect on the card surface. Layers
//! are plain values: they are rebuilt from the parameter store whenever it
//! changes and carry no identity beyond their kind.

use serde::{Deserialize, Serialize};

use crate::compositor::BlendMode;
use crate::effects::{EffectKind, EffectKnobs};

/// Depth step between consecutive layers of the stack (world units).
pub const EFFECT_LAYER_OFFSET: f32 = 0.001;

/// Position in the fixed paint order of the card.
///
/// The order is total: base card, effect layers, frame parts, case parts,
/// protective coating. Lower values paint first and sit deeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZOrder(u8);

impl ZOrder {
    pub const BASE_CARD: ZOrder = ZOrder(1);
    pub const HOLOGRAPHIC: ZOrder = ZOrder(2);
    pub const METALLIC: ZOrder = ZOrder(3);
    pub const PRISMATIC: ZOrder = ZOrder(4);
    // Special effects
    pub const GALAXY: ZOrder = ZOrder(5);
    pub const CRYSTAL: ZOrder = ZOrder(6);
    pub const SECRET_RARE: ZOrder = ZOrder(7);
    pub const FRAME_BACK: ZOrder = ZOrder(8);
    pub const FRAME_FRONT: ZOrder = ZOrder(9);
    pub const CASE_INTERIOR: ZOrder = ZOrder(10);
    pub const CASE_GLASS: ZOrder = ZOrder(11);
    pub const PROTECTIVE_COATING: ZOrder = ZOrder(12);

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Depth offset of the layer at `index` within the sorted active stack.
pub fn layer_depth_offset(index: usize) -> f32 {
    index as f32 * EFFECT_LAYER_OFFSET
}

/// One optical effect instance on the card surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectLayer {
    /// Stable identifier (the kind's id, e.g. "holographic")
    pub id: String,
    pub kind: EffectKind,
    /// Normalized intensity, always in (0, 1]
    pub intensity: f32,
    pub z_order: ZOrder,
    pub blend_mode: BlendMode,
    /// Derived opacity, capped by the kind's ceiling
    pub opacity: f32,
    /// Kind-specific shader knobs with defaults filled in
    pub knobs: EffectKnobs,
}

impl EffectLayer {
    /// Build a layer from a kind and a normalized intensity.
    ///
    /// Returns `None` for inactive layers (intensity ≤ 0 or not a number).
    pub fn new(kind: EffectKind, intensity: f32, knobs: EffectKnobs) -> Option<Self> {
        if !(intensity > 0.0) {
            return None;
        }
        let intensity = intensity.min(1.0);
        let traits = kind.traits();
        Some(Self {
            id: kind.id().to_string(),
            kind,
            intensity,
            z_order: traits.z_order,
            blend_mode: traits.blend_mode,
            opacity: kind.opacity_for(intensity),
            knobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_layer() {
        let knobs = EffectKnobs::defaults(EffectKind::Galaxy);
        assert!(EffectLayer::new(EffectKind::Galaxy, 0.0, knobs.clone()).is_none());
        assert!(EffectLayer::new(EffectKind::Galaxy, -0.5, knobs.clone()).is_none());
        assert!(EffectLayer::new(EffectKind::Galaxy, f32::NAN, knobs).is_none());
    }

    #[test]
    fn test_layer_from_table() {
        let layer = EffectLayer::new(
            EffectKind::Metallic,
            0.6,
            EffectKnobs::defaults(EffectKind::Metallic),
        )
        .unwrap();
        assert_eq!(layer.id, "metallic");
        assert_eq!(layer.z_order, ZOrder::METALLIC);
        assert_eq!(layer.blend_mode, BlendMode::Overlay);
        assert!((layer.opacity - 0.42).abs() < 1e-6);
    }

    #[test]
    fn test_depth_offsets() {
        assert_eq!(layer_depth_offset(0), 0.0);
        assert!((layer_depth_offset(3) - 3.0 * EFFECT_LAYER_OFFSET).abs() < 1e-9);
    }

    #[test]
    fn test_z_order_frame_above_effects() {
        assert!(ZOrder::SECRET_RARE < ZOrder::FRAME_BACK);
        assert!(ZOrder::CASE_GLASS < ZOrder::PROTECTIVE_COATING);
    }
}
