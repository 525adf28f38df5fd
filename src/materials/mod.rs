//! Renderable materials for effect layers
//!
//! A layer becomes one of three materials:
//!
//! - [`Material::Shader`]: the kind's live shader program with a packed
//!   uniform block (high and ultra tiers)
//! - [`Material::Physical`]: physically-based parameters from the kind's
//!   fallback table, sampling the procedural atlas
//! - [`Material::PassThrough`]: a neutral no-op for names outside the kind
//!   table
//!
//! Textures are owned by the host; materials only carry [`TextureRef`]s.

mod builder;

pub use builder::*;

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::atlas::{AtlasRegion, ProceduralAtlas};
use crate::compositor::BlendMode;
use crate::effects::{EffectKind, EffectUniforms};
use crate::shaders::ShaderProgram;

/// Host-owned texture handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub id: u64,
    pub label: String,
}

impl TextureRef {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Optional texture inputs. Anything missing degrades to a flat color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureBindings {
    pub base: Option<TextureRef>,
    pub environment: Option<TextureRef>,
    pub normal: Option<TextureRef>,
}

/// Per-frame values shared by every layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedUniforms {
    /// Seconds since session start, advanced on governor ticks only
    pub time: f32,
    /// From pointer or device orientation, supplied by the host
    pub light_direction: Vec3,
    pub camera_position: Vec3,
    pub view_proj: Mat4,
    /// Card transform before the layer's depth offset
    pub card_transform: Mat4,
    /// Product of the active interaction modifiers
    pub light_boost: f32,
    /// Luminance used where the base texture is missing
    pub flat_color: f32,
    pub textures: TextureBindings,
}

impl Default for SharedUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            light_direction: Vec3::Z,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            view_proj: Mat4::IDENTITY,
            card_transform: Mat4::IDENTITY,
            light_boost: 1.0,
            flat_color: 0.5,
            textures: TextureBindings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShaderMaterial {
    pub kind: EffectKind,
    pub program: Arc<ShaderProgram>,
    pub uniforms: EffectUniforms,
    pub textures: TextureBindings,
    pub blend_mode: BlendMode,
}

/// Atlas quadrant a fallback material samples
#[derive(Debug, Clone)]
pub struct AtlasSample {
    pub atlas: Arc<ProceduralAtlas>,
    pub region: AtlasRegion,
}

#[derive(Debug, Clone)]
pub struct PhysicalMaterial {
    pub kind: EffectKind,
    /// Base color; the kind's fallback color, or the tint for metallic
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    /// Index of refraction of the transmissive part
    pub ior: f32,
    pub clearcoat: f32,
    pub reflectivity: f32,
    pub opacity: f32,
    /// Multiplier from interaction modifiers
    pub emissive_boost: f32,
    /// World z offset applied by the compositor
    pub depth_offset: f32,
    /// `None` when no atlas was supplied; the material renders flat
    pub map: Option<AtlasSample>,
    pub textures: TextureBindings,
    pub blend_mode: BlendMode,
}

#[derive(Debug, Clone)]
pub enum Material {
    Shader(ShaderMaterial),
    Physical(PhysicalMaterial),
    PassThrough,
}

impl Material {
    pub fn is_shader(&self) -> bool {
        matches!(self, Material::Shader(_))
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, Material::Physical(_))
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Material::PassThrough)
    }

    pub fn kind(&self) -> Option<EffectKind> {
        match self {
            Material::Shader(m) => Some(m.kind),
            Material::Physical(m) => Some(m.kind),
            Material::PassThrough => None,
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        match self {
            Material::Shader(m) => m.blend_mode,
            Material::Physical(m) => m.blend_mode,
            Material::PassThrough => BlendMode::Normal,
        }
    }

    /// Update the time uniform without rebuilding
    pub fn set_time(&mut self, time: f32) {
        if let Material::Shader(m) = self {
            m.uniforms.time = time;
        }
    }

    /// Position the material at a world z offset on top of the card
    /// transform.
    pub fn place(&mut self, card_transform: Mat4, depth: f32) {
        match self {
            Material::Shader(m) => {
                let model = card_transform * Mat4::from_translation(Vec3::new(0.0, 0.0, depth));
                m.uniforms.model = model.to_cols_array_2d();
            }
            Material::Physical(m) => m.depth_offset = depth,
            Material::PassThrough => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_through_is_neutral() {
        let mut material = Material::PassThrough;
        assert_eq!(material.blend_mode(), BlendMode::Normal);
        assert_eq!(material.kind(), None);
        material.set_time(3.0);
        material.place(Mat4::IDENTITY, 0.5);
        assert!(material.is_pass_through());
    }

    #[test]
    fn test_shared_uniform_defaults() {
        let shared = SharedUniforms::default();
        assert_eq!(shared.light_boost, 1.0);
        assert!(shared.textures.base.is_none());
    }
}
