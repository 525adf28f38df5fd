//! Material construction for effect layers

use std::sync::Arc;

use super::{AtlasSample, Material, PhysicalMaterial, ShaderMaterial, SharedUniforms};
use crate::atlas::{ProceduralAtlas, Quadrant};
use crate::compositor::EffectLayer;
use crate::effects::{
    EffectKind, EffectKnobs, EffectUniforms, FLAG_BASE_TEXTURE, FLAG_ENV_MAP, FLAG_NORMAL_MAP,
    FLAG_SHADER_BLEND_ASSIST,
};
use crate::quality::{QualityProfile, QualityTier};
use crate::shaders::{ShaderCatalog, ShaderProgram};

/// Index of refraction for kinds without a refraction knob
pub const DEFAULT_IOR: f32 = 1.5;

const CRYSTAL_FACET_ROUGHNESS: f32 = 0.4;

/// Builds materials against a shader catalog.
pub struct MaterialBuilder<'a> {
    catalog: &'a ShaderCatalog,
}

impl<'a> MaterialBuilder<'a> {
    pub fn new(catalog: &'a ShaderCatalog) -> Self {
        Self { catalog }
    }

    /// Whether `kind` renders through its live shader under `profile`
    pub fn uses_shader(&self, kind: EffectKind, profile: &QualityProfile) -> bool {
        profile.allow_shaders && profile.tier > QualityTier::Low && self.catalog.contains(kind)
    }

    /// Build the material for one layer.
    ///
    /// `atlas` is sampled by the physical fallback; when absent the
    /// fallback renders with its flat color.
    pub fn build(
        &self,
        layer: &EffectLayer,
        profile: &QualityProfile,
        shared: &SharedUniforms,
        atlas: Option<&Arc<ProceduralAtlas>>,
    ) -> Material {
        if shared.textures.base.is_none() {
            tracing::trace!(target: "foilcard::materials", layer = %layer.id, "No base texture bound, using flat color");
        }

        match self.catalog.get(layer.kind) {
            Some(program) if self.uses_shader(layer.kind, profile) => {
                Material::Shader(Self::shader_material(layer, program, shared))
            }
            _ => Material::Physical(Self::physical_material(layer, shared, atlas)),
        }
    }

    /// Build from a host-supplied effect name. Names outside the kind
    /// table produce a pass-through material.
    pub fn build_named(
        &self,
        name: &str,
        intensity: f32,
        profile: &QualityProfile,
        shared: &SharedUniforms,
        atlas: Option<&Arc<ProceduralAtlas>>,
    ) -> Material {
        let Some(kind) = EffectKind::from_name(name) else {
            tracing::debug!(target: "foilcard::materials", name, "Unknown effect kind, using pass-through material");
            return Material::PassThrough;
        };
        match EffectLayer::new(kind, intensity, EffectKnobs::defaults(kind)) {
            Some(layer) => self.build(&layer, profile, shared, atlas),
            None => Material::PassThrough,
        }
    }

    fn shader_material(layer: &EffectLayer, program: Arc<ShaderProgram>, shared: &SharedUniforms) -> ShaderMaterial {
        let textures = shared.textures.clone();
        let mut uniforms = EffectUniforms::default();
        uniforms.set_matrices(shared.view_proj, shared.card_transform);
        uniforms.set_light(shared.light_direction, shared.light_boost);
        let cam = shared.camera_position;
        uniforms.camera_pos = [cam.x, cam.y, cam.z, 0.0];
        uniforms.time = shared.time;
        uniforms.intensity = layer.intensity;
        uniforms.opacity = layer.opacity;
        uniforms.flat_color = shared.flat_color;
        uniforms.set_flag(FLAG_BASE_TEXTURE, textures.base.is_some());
        uniforms.set_flag(FLAG_ENV_MAP, textures.environment.is_some());
        uniforms.set_flag(FLAG_NORMAL_MAP, textures.normal.is_some());
        // Blends against the flat color when no base texture is bound
        uniforms.set_flag(FLAG_SHADER_BLEND_ASSIST, layer.blend_mode.needs_shader_assist());
        uniforms.pack_knobs(&layer.knobs);

        ShaderMaterial {
            kind: layer.kind,
            program,
            uniforms,
            textures,
            blend_mode: layer.blend_mode,
        }
    }

    fn physical_material(
        layer: &EffectLayer,
        shared: &SharedUniforms,
        atlas: Option<&Arc<ProceduralAtlas>>,
    ) -> PhysicalMaterial {
        let fallback = layer.kind.traits().fallback;
        let color = match &layer.knobs {
            EffectKnobs::Metallic(k) => k.tint,
            EffectKnobs::SecretRare(k) => k.primary_color,
            _ => fallback.color,
        };
        let (ior, roughness, clearcoat) = match &layer.knobs {
            EffectKnobs::Prismatic(k) => (k.ior, fallback.roughness, fallback.clearcoat),
            // Finer facets scatter less; sparkle drives the clear coat
            EffectKnobs::Crystal(k) => (
                k.ior,
                (fallback.roughness + CRYSTAL_FACET_ROUGHNESS / k.facet_scale.max(1.0)).min(1.0),
                k.sparkle,
            ),
            _ => (DEFAULT_IOR, fallback.roughness, fallback.clearcoat),
        };
        let map = atlas.map(|atlas| AtlasSample {
            atlas: Arc::clone(atlas),
            region: Quadrant::for_kind(layer.kind).region(),
        });

        PhysicalMaterial {
            kind: layer.kind,
            color,
            metalness: fallback.metalness,
            roughness,
            transmission: fallback.transmission,
            ior,
            clearcoat,
            reflectivity: fallback.reflectivity,
            opacity: layer.opacity,
            emissive_boost: shared.light_boost.max(0.0),
            depth_offset: 0.0,
            map,
            textures: shared.textures.clone(),
            blend_mode: layer.blend_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasKey;
    use crate::effects::{CrystalKnobs, EffectParameters, GOLD_TINT};
    use crate::materials::{TextureBindings, TextureRef};
    use crate::quality::DeviceCapabilities;

    fn layer(kind: EffectKind, intensity: f32) -> EffectLayer {
        EffectLayer::new(kind, intensity, EffectKnobs::defaults(kind)).unwrap()
    }

    fn profile(tier: QualityTier, caps: &DeviceCapabilities) -> QualityProfile {
        QualityProfile::for_tier(tier, caps)
    }

    #[test]
    fn test_shader_material_at_ultra() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::Ultra, &DeviceCapabilities::default());
        let material = builder.build(&layer(EffectKind::Holographic, 0.8), &profile, &SharedUniforms::default(), None);

        let Material::Shader(m) = material else {
            panic!("expected shader material");
        };
        assert_eq!(m.kind, EffectKind::Holographic);
        assert!((m.uniforms.intensity - 0.8).abs() < 1e-6);
        assert!((m.uniforms.opacity - 0.64).abs() < 1e-6);
        assert_eq!(m.uniforms.params[2], 400.0);
    }

    #[test]
    fn test_fallback_below_high() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let caps = DeviceCapabilities::default();
        for tier in [QualityTier::Low, QualityTier::Medium] {
            let material = builder.build(&layer(EffectKind::Galaxy, 0.5), &profile(tier, &caps), &SharedUniforms::default(), None);
            assert!(material.is_physical());
        }
    }

    fn crystal(knobs: CrystalKnobs) -> EffectLayer {
        EffectLayer::new(EffectKind::Crystal, 1.0, EffectKnobs::Crystal(knobs)).unwrap()
    }

    #[test]
    fn test_crystal_knobs_reach_shader() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::Ultra, &DeviceCapabilities::default());
        let knobs = CrystalKnobs {
            ior: 1.7,
            facet_scale: 16.0,
            sparkle: 0.2,
        };
        let Material::Shader(m) = builder.build(&crystal(knobs), &profile, &SharedUniforms::default(), None) else {
            panic!("expected shader material");
        };
        let schema = &m.program.uniform_schema;
        assert_eq!(m.uniforms.params[schema.field("refractiveIndex").unwrap().slot], 1.7);
        assert_eq!(m.uniforms.params[schema.field("facetScale").unwrap().slot], 16.0);
        assert_eq!(m.uniforms.params[schema.field("sparkle").unwrap().slot], 0.2);
    }

    #[test]
    fn test_crystal_knobs_shape_fallback() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::Low, &DeviceCapabilities::default());
        let shared = SharedUniforms::default();

        let Material::Physical(stock) = builder.build(&crystal(CrystalKnobs::default()), &profile, &shared, None) else {
            panic!("expected physical material");
        };
        assert_eq!(stock.transmission, 0.9);
        assert_eq!(stock.ior, 2.42);
        assert_eq!(stock.clearcoat, 0.6);
        assert!(stock.map.is_none());

        let tuned = CrystalKnobs {
            ior: 1.3,
            facet_scale: 2.0,
            sparkle: 0.0,
        };
        let Material::Physical(m) = builder.build(&crystal(tuned), &profile, &shared, None) else {
            panic!("expected physical material");
        };
        assert_eq!(m.ior, 1.3);
        assert_eq!(m.clearcoat, 0.0);
        assert!(m.roughness > stock.roughness);
    }

    #[test]
    fn test_fallback_samples_atlas_quadrant() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::Low, &DeviceCapabilities::minimal());
        let atlas = Arc::new(ProceduralAtlas::generate(
            AtlasKey::new([EffectKind::Metallic].into_iter().collect(), QualityTier::Low),
            16,
        ));
        let Material::Physical(m) = builder.build(&layer(EffectKind::Metallic, 0.6), &profile, &SharedUniforms::default(), Some(&atlas)) else {
            panic!("expected physical material");
        };
        let sample = m.map.unwrap();
        assert_eq!(sample.region, Quadrant::BrushedMetal.region());
        assert!(Arc::ptr_eq(&sample.atlas, &atlas));
        assert_eq!(m.metalness, 1.0);
    }

    #[test]
    fn test_gold_alias_tints_fallback() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let knobs = EffectKnobs::from_parameters(EffectKind::Metallic, "gold", &EffectParameters::with_intensity(50.0));
        let gold = EffectLayer::new(EffectKind::Metallic, 0.5, knobs).unwrap();
        let profile = profile(QualityTier::Medium, &DeviceCapabilities::default());
        let Material::Physical(m) = builder.build(&gold, &profile, &SharedUniforms::default(), None) else {
            panic!("expected physical material");
        };
        assert_eq!(m.color, GOLD_TINT);
    }

    #[test]
    fn test_unregistered_kind_falls_back() {
        let mut catalog = ShaderCatalog::builtin();
        catalog.unregister(EffectKind::Prismatic);
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::Ultra, &DeviceCapabilities::default());
        assert!(builder
            .build(&layer(EffectKind::Prismatic, 0.5), &profile, &SharedUniforms::default(), None)
            .is_physical());
    }

    #[test]
    fn test_unknown_name_is_pass_through() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::Ultra, &DeviceCapabilities::default());
        let shared = SharedUniforms::default();
        assert!(builder.build_named("sparkle", 0.5, &profile, &shared, None).is_pass_through());
        assert!(builder.build_named("holographic", 0.0, &profile, &shared, None).is_pass_through());
        assert!(builder.build_named("chrome", 0.5, &profile, &shared, None).is_shader());
    }

    #[test]
    fn test_texture_flags() {
        let catalog = ShaderCatalog::builtin();
        let builder = MaterialBuilder::new(&catalog);
        let profile = profile(QualityTier::High, &DeviceCapabilities::default());

        let bare = builder.build(&layer(EffectKind::Metallic, 0.5), &profile, &SharedUniforms::default(), None);
        let Material::Shader(m) = bare else {
            panic!("expected shader material");
        };
        assert_eq!(m.uniforms.flags, [0.0, 0.0, 0.0, 1.0]);

        let shared = SharedUniforms {
            textures: TextureBindings {
                base: Some(TextureRef::new(1, "card-art")),
                environment: None,
                normal: Some(TextureRef::new(2, "card-normal")),
            },
            ..Default::default()
        };
        let Material::Shader(m) = builder.build(&layer(EffectKind::Metallic, 0.5), &profile, &shared, None) else {
            panic!("expected shader material");
        };
        assert_eq!(m.uniforms.flags, [1.0, 0.0, 1.0, 1.0]);
    }
}
