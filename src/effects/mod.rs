//! Effect model for the card surface
//!
//! This module turns host-supplied effect parameters into the values the
//! rest of the pipeline consumes:
//!
//! - **Kinds** (`kind.rs`): the closed set of optical effects and their
//!   static dispatch table (z-order, blend mode, opacity scaling, fallback
//!   material values)
//! - **Types** (`types.rs`): the serializable parameter store and typed
//!   per-kind knobs with documented defaults
//! - **Resolver** (`resolver.rs`): parameter store → sorted effect layers
//! - **Interactions** (`interaction.rs`): pair rules producing boost factors
//! - **Uniforms** (`uniforms.rs`): GPU uniform block packing
//!
//! # Usage
//!
//! ```ignore
//! let params = EffectParameterStore::new()
//!     .with("holographic", EffectParameters::with_intensity(80.0))
//!     .with("chrome", EffectParameters::with_intensity(60.0));
//!
//! let layers = LayerResolver::resolve(&params);
//! let interactions = InteractionResolver::resolve(&layers);
//! assert!(interactions.contains(ModifierKind::RainbowEnhancement));
//! ```

mod interaction;
mod kind;
mod resolver;
mod types;
mod uniforms;

pub use interaction::*;
pub use kind::*;
pub use resolver::*;
pub use types::*;
pub use uniforms::*;
