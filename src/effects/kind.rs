//! Effect kinds and their static dispatch table
//!
//! Every optical effect is one variant of [`EffectKind`]. Everything that is
//! fixed per kind (paint order, blend mode, opacity scaling, fallback
//! material values, host parameter names) lives in [`KindTraits`], looked up
//! through an exhaustive `match` so adding a kind fails to compile until the
//! table is complete.
//!
//! The opacity scales and ceilings are empirically tuned values. They are
//! kept as a table rather than derived from anything physical.

use serde::{Deserialize, Serialize};

use crate::compositor::{BlendMode, ZOrder};

/// The optical effect categories a card surface can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    /// Thin-film rainbow foil
    Holographic,
    /// Brushed chrome or gold
    Metallic,
    /// Chromatic dispersion ("refractor")
    Prismatic,
    /// Spiral nebula foil with stars
    Galaxy,
    /// Faceted crystal sparkle
    Crystal,
    /// Two animated foils plus embossed highlight
    SecretRare,
}

/// Physically-based fallback values for a kind, used when no live shader
/// is available at the current quality tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackParams {
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub clearcoat: f32,
    pub reflectivity: f32,
    /// Base tint (linear RGB)
    pub color: [f32; 3],
}

/// Static per-kind properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindTraits {
    pub z_order: ZOrder,
    pub blend_mode: BlendMode,
    /// Opacity per unit of normalized intensity
    pub opacity_scale: f32,
    /// Upper bound for the layer opacity
    pub opacity_ceiling: f32,
    pub fallback: FallbackParams,
}

impl EffectKind {
    /// All kinds in paint order.
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Holographic,
        EffectKind::Metallic,
        EffectKind::Prismatic,
        EffectKind::Galaxy,
        EffectKind::Crystal,
        EffectKind::SecretRare,
    ];

    /// Stable identifier used as the layer id.
    pub fn id(self) -> &'static str {
        match self {
            EffectKind::Holographic => "holographic",
            EffectKind::Metallic => "metallic",
            EffectKind::Prismatic => "prismatic",
            EffectKind::Galaxy => "galaxy",
            EffectKind::Crystal => "crystal",
            EffectKind::SecretRare => "secretRare",
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            EffectKind::Holographic => "Holographic",
            EffectKind::Metallic => "Metallic",
            EffectKind::Prismatic => "Prismatic",
            EffectKind::Galaxy => "Galaxy",
            EffectKind::Crystal => "Crystal",
            EffectKind::SecretRare => "Secret Rare",
        }
    }

    /// Parameter-store keys that address this kind, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            EffectKind::Holographic => &["holographic", "holo"],
            EffectKind::Metallic => &["metallic", "chrome", "gold"],
            EffectKind::Prismatic => &["prismatic", "refractor"],
            EffectKind::Galaxy => &["galaxy"],
            EffectKind::Crystal => &["crystal"],
            EffectKind::SecretRare => &["secretRare", "secret_rare"],
        }
    }

    /// Map a parameter-store key onto a kind.
    pub fn from_name(name: &str) -> Option<EffectKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.aliases().contains(&name))
    }

    /// Bit used in [`KindSet`].
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Static dispatch table.
    pub fn traits(self) -> KindTraits {
        match self {
            EffectKind::Holographic => KindTraits {
                z_order: ZOrder::HOLOGRAPHIC,
                blend_mode: BlendMode::Screen,
                opacity_scale: 0.8,
                opacity_ceiling: 0.75,
                fallback: FallbackParams {
                    metalness: 0.9,
                    roughness: 0.1,
                    transmission: 0.0,
                    clearcoat: 1.0,
                    reflectivity: 1.0,
                    color: [1.0, 1.0, 1.0],
                },
            },
            EffectKind::Metallic => KindTraits {
                z_order: ZOrder::METALLIC,
                blend_mode: BlendMode::Overlay,
                opacity_scale: 0.7,
                opacity_ceiling: 0.7,
                fallback: FallbackParams {
                    metalness: 1.0,
                    roughness: 0.25,
                    transmission: 0.0,
                    clearcoat: 0.5,
                    reflectivity: 0.9,
                    color: [0.9, 0.91, 0.93],
                },
            },
            EffectKind::Prismatic => KindTraits {
                z_order: ZOrder::PRISMATIC,
                blend_mode: BlendMode::Additive,
                opacity_scale: 0.6,
                opacity_ceiling: 0.6,
                fallback: FallbackParams {
                    metalness: 0.2,
                    roughness: 0.05,
                    transmission: 0.6,
                    clearcoat: 1.0,
                    reflectivity: 0.8,
                    color: [1.0, 1.0, 1.0],
                },
            },
            EffectKind::Galaxy => KindTraits {
                z_order: ZOrder::GALAXY,
                blend_mode: BlendMode::Screen,
                opacity_scale: 0.7,
                opacity_ceiling: 0.65,
                fallback: FallbackParams {
                    metalness: 0.6,
                    roughness: 0.3,
                    transmission: 0.0,
                    clearcoat: 0.8,
                    reflectivity: 0.7,
                    color: [0.35, 0.2, 0.6],
                },
            },
            EffectKind::Crystal => KindTraits {
                z_order: ZOrder::CRYSTAL,
                blend_mode: BlendMode::Additive,
                opacity_scale: 0.5,
                opacity_ceiling: 0.5,
                fallback: FallbackParams {
                    metalness: 0.0,
                    roughness: 0.0,
                    transmission: 0.9,
                    clearcoat: 1.0,
                    reflectivity: 1.0,
                    color: [0.95, 0.98, 1.0],
                },
            },
            EffectKind::SecretRare => KindTraits {
                z_order: ZOrder::SECRET_RARE,
                blend_mode: BlendMode::ColorDodge,
                opacity_scale: 0.9,
                opacity_ceiling: 0.85,
                fallback: FallbackParams {
                    metalness: 1.0,
                    roughness: 0.15,
                    transmission: 0.0,
                    clearcoat: 1.0,
                    reflectivity: 1.0,
                    color: [1.0, 0.84, 0.45],
                },
            },
        }
    }

    /// Layer opacity for a normalized intensity.
    pub fn opacity_for(self, intensity: f32) -> f32 {
        let traits = self.traits();
        (intensity * traits.opacity_scale).min(traits.opacity_ceiling)
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A set of effect kinds, used as part of cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, kind: EffectKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = EffectKind> {
        EffectKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<EffectKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = EffectKind>>(iter: I) -> Self {
        let mut set = KindSet::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}
