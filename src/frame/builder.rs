//! Frame overlay node construction

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{FrameCatalog, FrameConfig, FrameKind, FrameMaterial, NO_FRAME};
use crate::compositor::{ZOrder, EFFECT_LAYER_OFFSET};
use crate::quality::{QualityProfile, QualityTier};

/// Thickness of the case back panel
const BACK_PANEL_THICKNESS: f32 = 0.004;

/// Minimum side wall thickness
const MIN_WALL_THICKNESS: f32 = 0.005;

/// Card size in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Default for CardDimensions {
    /// Standard 63 x 88 mm card at 1 unit = 25.2 mm
    fn default() -> Self {
        Self {
            width: 2.5,
            height: 3.5,
            depth: 0.02,
        }
    }
}

/// Depth of the frame's front plane: just past the last effect layer.
pub fn frame_base_offset(card_depth: f32, active_layer_count: usize) -> f32 {
    card_depth / 2.0 + (active_layer_count + 1) as f32 * EFFECT_LAYER_OFFSET
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Plane {
        width: f32,
        height: f32,
    },
    /// Flat rectangle with a rectangular hole
    BorderRing {
        outer_width: f32,
        outer_height: f32,
        inner_width: f32,
        inner_height: f32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePart {
    Border,
    Back,
    WallLeft,
    WallRight,
    WallTop,
    WallBottom,
    Glass,
}

/// One renderable piece of a frame overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub part: FramePart,
    pub geometry: Geometry,
    pub material: FrameMaterial,
    /// Center position relative to the card center
    pub position: Vec3,
    pub z_order: ZOrder,
    pub transparent: bool,
}

impl RenderNode {
    fn new(part: FramePart, geometry: Geometry, material: FrameMaterial, position: Vec3, z_order: ZOrder) -> Self {
        Self {
            part,
            geometry,
            material,
            position,
            z_order,
            transparent: material.is_transparent(),
        }
    }
}

/// Builds overlay nodes for the named frame.
pub struct FrameOverlayBuilder<'a> {
    catalog: &'a FrameCatalog,
}

impl<'a> FrameOverlayBuilder<'a> {
    pub fn new(catalog: &'a FrameCatalog) -> Self {
        Self { catalog }
    }

    /// Build the overlay for `frame_name`.
    ///
    /// Unknown names and "none" produce no nodes. The frame is placed at
    /// [`frame_base_offset`] so it moves out as effect layers are added.
    pub fn build(
        &self,
        frame_name: &str,
        card: CardDimensions,
        active_layer_count: usize,
        profile: &QualityProfile,
    ) -> Vec<RenderNode> {
        if frame_name == NO_FRAME {
            return Vec::new();
        }
        let Some(config) = self.catalog.get(frame_name) else {
            tracing::warn!(target: "foilcard::frame", frame = frame_name, "Frame not found, rendering without frame");
            return Vec::new();
        };

        let base = frame_base_offset(card.depth, active_layer_count);
        let nodes = match config.kind {
            FrameKind::Border => Self::border(config, card, base),
            FrameKind::Case => Self::case(config, card, base, profile.tier),
        };

        tracing::debug!(
            target: "foilcard::frame",
            frame = frame_name,
            nodes = nodes.len(),
            base_offset = base,
            "Frame overlay built"
        );
        nodes
    }

    fn border(config: &FrameConfig, card: CardDimensions, base: f32) -> Vec<RenderNode> {
        let geometry = Geometry::BorderRing {
            outer_width: card.width * config.multiplier,
            outer_height: card.height * config.multiplier,
            inner_width: card.width,
            inner_height: card.height,
        };
        vec![RenderNode::new(
            FramePart::Border,
            geometry,
            config.materials.primary,
            Vec3::new(0.0, 0.0, base),
            ZOrder::FRAME_FRONT,
        )]
    }

    fn case(config: &FrameConfig, card: CardDimensions, base: f32, tier: QualityTier) -> Vec<RenderNode> {
        let width = card.width * config.multiplier;
        let height = card.height * config.multiplier;
        let wall = ((width - card.width) / 2.0).max(MIN_WALL_THICKNESS);
        let wall_material = config.materials.secondary.unwrap_or(config.materials.primary);
        let wall_z = base - config.depth / 2.0;

        let mut nodes = vec![RenderNode::new(
            FramePart::Back,
            Geometry::Box {
                width,
                height,
                depth: BACK_PANEL_THICKNESS,
            },
            config.materials.primary,
            Vec3::new(0.0, 0.0, base - config.depth),
            ZOrder::FRAME_BACK,
        )];

        let side = Geometry::Box {
            width: wall,
            height,
            depth: config.depth,
        };
        let cap = Geometry::Box {
            width: width - 2.0 * wall,
            height: wall,
            depth: config.depth,
        };
        let x = width / 2.0 - wall / 2.0;
        let y = height / 2.0 - wall / 2.0;
        for (part, geometry, position) in [
            (FramePart::WallLeft, side, Vec3::new(-x, 0.0, wall_z)),
            (FramePart::WallRight, side, Vec3::new(x, 0.0, wall_z)),
            (FramePart::WallTop, cap, Vec3::new(0.0, y, wall_z)),
            (FramePart::WallBottom, cap, Vec3::new(0.0, -y, wall_z)),
        ] {
            nodes.push(RenderNode::new(part, geometry, wall_material, position, ZOrder::CASE_INTERIOR));
        }

        if let Some(glass) = config.materials.glass {
            if tier >= QualityTier::Medium {
                nodes.push(RenderNode::new(
                    FramePart::Glass,
                    Geometry::Plane { width, height },
                    glass,
                    Vec3::new(0.0, 0.0, base),
                    ZOrder::CASE_GLASS,
                ));
            }
        }

        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::DeviceCapabilities;

    fn profile(tier: QualityTier) -> QualityProfile {
        QualityProfile::for_tier(tier, &DeviceCapabilities::default())
    }

    #[test]
    fn test_base_offset_tracks_layer_count() {
        let depth = 0.02;
        for n in 0..8 {
            let delta = frame_base_offset(depth, n + 1) - frame_base_offset(depth, n);
            assert!((delta - EFFECT_LAYER_OFFSET).abs() < 1e-7);
        }
        assert!((frame_base_offset(depth, 0) - (0.01 + EFFECT_LAYER_OFFSET)).abs() < 1e-7);
    }

    #[test]
    fn test_unknown_and_none_frames_empty() {
        let catalog = FrameCatalog::builtin();
        let builder = FrameOverlayBuilder::new(&catalog);
        let card = CardDimensions::default();
        assert!(builder.build("none", card, 2, &profile(QualityTier::High)).is_empty());
        assert!(builder.build("velvet-pouch", card, 2, &profile(QualityTier::High)).is_empty());
    }

    #[test]
    fn test_border_ring() {
        let catalog = FrameCatalog::builtin();
        let builder = FrameOverlayBuilder::new(&catalog);
        let card = CardDimensions::default();
        let nodes = builder.build("gold-border", card, 3, &profile(QualityTier::Low));
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.part, FramePart::Border);
        assert_eq!(node.z_order, ZOrder::FRAME_FRONT);
        assert!((node.position.z - frame_base_offset(card.depth, 3)).abs() < 1e-7);
        match node.geometry {
            Geometry::BorderRing { outer_width, inner_width, .. } => {
                assert!((outer_width - 2.5 * 1.08).abs() < 1e-5);
                assert_eq!(inner_width, 2.5);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_case_parts() {
        let catalog = FrameCatalog::builtin();
        let builder = FrameOverlayBuilder::new(&catalog);
        let card = CardDimensions::default();
        let nodes = builder.build("magnetic-case", card, 2, &profile(QualityTier::High));
        let parts: Vec<_> = nodes.iter().map(|n| n.part).collect();
        assert_eq!(
            parts,
            vec![
                FramePart::Back,
                FramePart::WallLeft,
                FramePart::WallRight,
                FramePart::WallTop,
                FramePart::WallBottom,
                FramePart::Glass,
            ]
        );

        let base = frame_base_offset(card.depth, 2);
        let back = &nodes[0];
        let glass = nodes.last().unwrap();
        assert!((back.position.z - (base - 0.08)).abs() < 1e-6);
        assert!((glass.position.z - base).abs() < 1e-7);
        assert!(back.position.z < glass.position.z);
        assert!(glass.transparent);
    }

    #[test]
    fn test_glass_requires_medium_tier() {
        let catalog = FrameCatalog::builtin();
        let builder = FrameOverlayBuilder::new(&catalog);
        let card = CardDimensions::default();

        let low = builder.build("toploader", card, 1, &profile(QualityTier::Low));
        assert!(low.iter().all(|n| n.part != FramePart::Glass));
        assert_eq!(low.len(), 5);

        let medium = builder.build("toploader", card, 1, &profile(QualityTier::Medium));
        assert!(medium.iter().any(|n| n.part == FramePart::Glass));
    }

    #[test]
    fn test_frame_outside_effect_stack() {
        let card = CardDimensions::default();
        for active in 0..6 {
            // Front-most effect layer sits at card_depth/2 + active * offset
            let last_layer = card.depth / 2.0 + active as f32 * EFFECT_LAYER_OFFSET;
            assert!(frame_base_offset(card.depth, active) > last_layer);
        }
    }
}
