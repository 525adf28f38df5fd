//! Effect stack composition
//!
//! [`Compositor`] positions built materials at their depth offsets.
//! [`CardCompositor`] owns the per-session state and runs the pipeline in
//! its fixed order: layer resolution, interactions, quality, materials,
//! placement, frame overlay.

use std::sync::Arc;

use glam::Mat4;

use super::{layer_depth_offset, BlendMode, EffectLayer, ZOrder, EFFECT_LAYER_OFFSET};
use crate::atlas::{AtlasCache, AtlasKey, ProceduralAtlas};
use crate::effects::{
    EffectKind, EffectParameterStore, InteractionResolver, Interactions, KindSet, LayerResolver,
};
use crate::frame::{CardDimensions, FrameCatalog, FrameOverlayBuilder, RenderNode};
use crate::materials::{Material, MaterialBuilder, SharedUniforms};
use crate::quality::{
    DeviceCapabilities, DowngradeRecommendation, QualityGovernor, QualityProfile, QualityTier, UniformClock,
};
use crate::settings::CompositorSettings;
use crate::shaders::{ShaderCatalog, ShaderWatcher};
use crate::telemetry::FrameStats;

/// One effect layer ready for submission.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub layer_id: String,
    pub kind: EffectKind,
    pub z_order: ZOrder,
    /// World z offset from the card center
    pub depth: f32,
    pub blend_mode: BlendMode,
    pub material: Material,
}

/// Everything the host renderer submits for one card.
#[derive(Debug, Clone)]
pub struct RenderList {
    /// Effect layers in paint order
    pub effects: Vec<DrawItem>,
    /// Frame overlay parts, drawn after the effects
    pub frame: Vec<RenderNode>,
    pub tier: QualityTier,
    pub interactions: Interactions,
    /// Atlas sampled by the fallback materials, if any layer fell back
    pub atlas: Option<Arc<ProceduralAtlas>>,
    /// Atlases dropped from the cache since the previous list. Release
    /// their GPU copies before uploading `atlas`.
    pub released_atlases: Vec<AtlasKey>,
}

impl RenderList {
    /// Push a new time value into every shader material
    pub fn set_time(&mut self, time: f32) {
        for item in &mut self.effects {
            item.material.set_time(time);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.frame.is_empty()
    }

    pub fn shader_count(&self) -> usize {
        self.effects.iter().filter(|item| item.material.is_shader()).count()
    }
}

/// Stateless placement and preview helpers.
pub struct Compositor;

impl Compositor {
    /// World z of the layer at `index` in the sorted active stack.
    ///
    /// The first layer sits one offset above the card's front face.
    pub fn effect_depth(card_depth: f32, index: usize) -> f32 {
        card_depth / 2.0 + EFFECT_LAYER_OFFSET + layer_depth_offset(index)
    }

    /// Pair sorted layers with their materials and place each one.
    pub fn compose(
        layers: &[EffectLayer],
        materials: Vec<Material>,
        card_transform: Mat4,
        card_depth: f32,
    ) -> Vec<DrawItem> {
        layers
            .iter()
            .zip(materials)
            .enumerate()
            .map(|(index, (layer, mut material))| {
                let depth = Self::effect_depth(card_depth, index);
                material.place(card_transform, depth);
                DrawItem {
                    layer_id: layer.id.clone(),
                    kind: layer.kind,
                    z_order: layer.z_order,
                    depth,
                    blend_mode: layer.blend_mode,
                    material,
                }
            })
            .collect()
    }

    /// Blend one pixel through the stack on the CPU.
    ///
    /// `sample` returns the layer's color at the pixel. Layers are applied
    /// in slice order with their own blend mode and opacity.
    pub fn preview_pixel<F>(base: [f32; 3], layers: &[EffectLayer], mut sample: F) -> [f32; 3]
    where
        F: FnMut(&EffectLayer) -> [f32; 3],
    {
        layers
            .iter()
            .fold(base, |dst, layer| layer.blend_mode.apply(sample(layer), dst, layer.opacity))
    }
}

/// Per-card pipeline state.
pub struct CardCompositor {
    resolver: LayerResolver,
    governor: QualityGovernor,
    clock: UniformClock,
    shaders: ShaderCatalog,
    atlases: AtlasCache,
    frames: FrameCatalog,
    frame_name: String,
    card: CardDimensions,
    /// Keeps the atlas of the latest render list alive in the cache
    active_atlas: Option<Arc<ProceduralAtlas>>,
    /// Keys released by the cache that the host has not been handed yet
    released: Vec<AtlasKey>,
}

impl CardCompositor {
    pub fn new(capabilities: DeviceCapabilities, settings: &CompositorSettings) -> Self {
        Self::with_catalogs(capabilities, settings, ShaderCatalog::builtin(), FrameCatalog::builtin())
    }

    pub fn with_catalogs(
        capabilities: DeviceCapabilities,
        settings: &CompositorSettings,
        shaders: ShaderCatalog,
        frames: FrameCatalog,
    ) -> Self {
        let governor = QualityGovernor::new(capabilities, settings.requested_tier, settings.governor_config());
        let clock = UniformClock::new(governor.profile().update_interval_ms);

        tracing::info!(
            target: "foilcard::compositor",
            tier = %governor.tier(),
            frame = %settings.frame_name,
            shader_programs = shaders.len(),
            "Card compositor created"
        );

        Self {
            resolver: LayerResolver::new(),
            governor,
            clock,
            shaders,
            atlases: AtlasCache::new(),
            frames,
            frame_name: settings.frame_name.clone(),
            card: CardDimensions::default(),
            active_atlas: None,
            released: Vec::new(),
        }
    }

    /// Build the render list for the current parameters.
    ///
    /// Layer resolution is memoized on the store content, so calling this
    /// every frame with unchanged parameters only rebuilds materials.
    pub fn compose(&mut self, params: &EffectParameterStore, shared: &SharedUniforms) -> RenderList {
        let layers = self.resolver.resolve_cached(params);
        let interactions = InteractionResolver::resolve(&layers);
        let profile = self.governor.profile();

        let atlas = self.atlas_for(&layers, &profile);

        let shared = SharedUniforms {
            time: self.clock.time(),
            light_boost: shared.light_boost * interactions.light_boost(),
            ..shared.clone()
        };
        let builder = MaterialBuilder::new(&self.shaders);
        let materials = layers
            .iter()
            .map(|layer| builder.build(layer, &profile, &shared, atlas.as_ref()))
            .collect();

        let effects = Compositor::compose(&layers, materials, shared.card_transform, self.card.depth);
        let frame = FrameOverlayBuilder::new(&self.frames).build(&self.frame_name, self.card, layers.len(), &profile);

        self.active_atlas = atlas.clone();
        let unreferenced = self.atlases.release_unreferenced();
        self.released.extend(unreferenced);

        tracing::debug!(
            target: "foilcard::compositor",
            layers = effects.len(),
            frame_nodes = frame.len(),
            tier = %profile.tier,
            light_boost = shared.light_boost,
            "Composed card"
        );

        RenderList {
            effects,
            frame,
            tier: profile.tier,
            interactions,
            atlas,
            released_atlases: self.take_released_atlases(),
        }
    }

    /// Advance the uniform clock. On a tick the new time is written into
    /// `list`; between ticks the list is left untouched.
    pub fn tick(&mut self, now_ms: f64, list: &mut RenderList) -> bool {
        if !self.clock.tick(now_ms) {
            return false;
        }
        list.set_time(self.clock.time());
        true
    }

    /// Record a frame time. Returns an advisory recommendation; the tier
    /// is not changed.
    pub fn observe_frame(&mut self, frame_ms: f64) -> Option<DowngradeRecommendation> {
        self.governor.observe_frame(frame_ms)
    }

    /// Change the requested tier. Atlases generated for other tiers are
    /// released when the effective tier changes; their keys arrive with the
    /// next render list or through `take_released_atlases`.
    pub fn set_requested_tier(&mut self, tier: QualityTier) -> bool {
        let changed = self.governor.set_requested_tier(tier);
        if changed {
            let profile = self.governor.profile();
            self.clock.set_interval(profile.update_interval_ms);
            self.active_atlas = None;
            let stale = self.atlases.retain_tier(profile.tier);
            self.released.extend(stale);
        }
        changed
    }

    /// Keys of atlases the cache dropped that have not been reported yet
    pub fn take_released_atlases(&mut self) -> Vec<AtlasKey> {
        std::mem::take(&mut self.released)
    }

    pub fn set_frame(&mut self, name: impl Into<String>) {
        self.frame_name = name.into();
    }

    pub fn set_card_dimensions(&mut self, card: CardDimensions) {
        self.card = card;
    }

    /// Apply pending shader edits. Returns the kinds whose program changed.
    pub fn reload_shaders(&mut self, watcher: &mut ShaderWatcher) -> Vec<EffectKind> {
        watcher.poll_into(&mut self.shaders)
    }

    /// Release every cached atlas. Returns the released keys so GPU copies
    /// can be destroyed.
    pub fn dispose(&mut self) -> Vec<AtlasKey> {
        self.active_atlas = None;
        self.resolver.invalidate();
        let mut released = self.take_released_atlases();
        released.extend(self.atlases.dispose());
        released
    }

    pub fn profile(&self) -> QualityProfile {
        self.governor.profile()
    }

    pub fn tier(&self) -> QualityTier {
        self.governor.tier()
    }

    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn frame_name(&self) -> &str {
        &self.frame_name
    }

    pub fn card_dimensions(&self) -> CardDimensions {
        self.card
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.governor.frame_stats()
    }

    pub fn atlas_cache(&self) -> &AtlasCache {
        &self.atlases
    }

    pub fn shader_catalog(&self) -> &ShaderCatalog {
        &self.shaders
    }

    pub fn shader_catalog_mut(&mut self) -> &mut ShaderCatalog {
        &mut self.shaders
    }

    pub fn frame_catalog_mut(&mut self) -> &mut FrameCatalog {
        &mut self.frames
    }

    /// Atlas for the layers that will not run a live shader.
    fn atlas_for(&mut self, layers: &[EffectLayer], profile: &QualityProfile) -> Option<Arc<ProceduralAtlas>> {
        let builder = MaterialBuilder::new(&self.shaders);
        let fallback: KindSet = layers
            .iter()
            .map(|layer| layer.kind)
            .filter(|kind| !builder.uses_shader(*kind, profile))
            .collect();
        if fallback.is_empty() {
            return None;
        }
        Some(self.atlases.get_or_create(AtlasKey::new(fallback, profile.tier), profile))
    }
}

impl Drop for CardCompositor {
    fn drop(&mut self) {
        if !self.atlases.is_empty() {
            self.dispose();
        }
    }
}
