//! Foilcard
//!
//! Multi-layer optical effect compositing for trading cards: holographic
//! foil, brushed metal, prismatic refraction, galaxy foil, crystal and
//! secret-rare foil stacked over a base texture, with border and case
//! overlays and device-adaptive quality tiers.
//!
//! The crate does not own a render loop. A host feeds it an
//! [`EffectParameterStore`] each time parameters change and submits the
//! returned [`RenderList`].

pub mod atlas;
pub mod compositor;
pub mod effects;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod materials;
pub mod optics;
pub mod quality;
pub mod settings;
pub mod shaders;
pub mod telemetry;

pub use atlas::{AtlasCache, AtlasKey, ProceduralAtlas, Quadrant};
pub use compositor::{
    BlendMode, CardCompositor, Compositor, DrawItem, EffectLayer, RenderList, ZOrder, EFFECT_LAYER_OFFSET,
};
pub use effects::{
    EffectKind, EffectParameterStore, EffectParameters, InteractionResolver, Interactions, LayerResolver,
    ModifierKind,
};
pub use error::{LogError, SettingsError, ShaderError};
pub use frame::{frame_base_offset, CardDimensions, FrameCatalog, FrameOverlayBuilder, RenderNode};
pub use materials::{Material, MaterialBuilder, SharedUniforms, TextureBindings, TextureRef};
pub use quality::{
    DeviceCapabilities, DowngradeRecommendation, QualityGovernor, QualityProfile, QualityTier, UniformClock,
};
pub use settings::CompositorSettings;
pub use shaders::{ShaderCatalog, ShaderProgram, ShaderWatcher};
