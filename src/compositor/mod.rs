//! Compositor module
//!
//! The compositor turns resolved effect layers into an ordered list of
//! placed draw items for the host renderer.
//!
//! # Architecture
//!
//! - `EffectLayer`: one active optical effect with its z-order, blend mode and opacity
//! - `BlendMode`: how a layer combines with what is beneath it
//! - `Compositor`: depth placement and CPU preview blending
//! - `CardCompositor`: per-card pipeline state (resolver memo, quality governor,
//!   uniform clock, atlas cache, frame selection)

pub mod blend;
pub mod layer;
pub mod stack;

pub use blend::BlendMode;
pub use layer::{layer_depth_offset, EffectLayer, ZOrder, EFFECT_LAYER_OFFSET};
pub use stack::{CardCompositor, Compositor, DrawItem, RenderList};
