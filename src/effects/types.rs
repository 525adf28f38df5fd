//! Core effect data types
//!
//! These types define the serializable input model for effects: the
//! parameter store the host UI produces, and the typed knob sets the
//! resolver derives from it.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::EffectKind;

/// Parameter value types accepted from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Float(f32),
    /// RGB color (0.0-1.0 per channel)
    Vec3([f32; 3]),
    /// RGBA color (0.0-1.0 per channel)
    Color([f32; 4]),
    String(String),
}

impl ParameterValue {
    /// Get value as f32 (for shader uniforms)
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Get value as an RGB triple; RGBA drops its alpha.
    pub fn as_rgb(&self) -> Option<[f32; 3]> {
        match self {
            ParameterValue::Vec3(v) => Some(*v),
            ParameterValue::Color(v) => Some([v[0], v[1], v[2]]),
            _ => None,
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        match self {
            ParameterValue::Bool(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            ParameterValue::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            ParameterValue::Vec3(v) => {
                2u8.hash(state);
                v.iter().for_each(|c| c.to_bits().hash(state));
            }
            ParameterValue::Color(v) => {
                3u8.hash(state);
                v.iter().for_each(|c| c.to_bits().hash(state));
            }
            ParameterValue::String(v) => {
                4u8.hash(state);
                v.hash(state);
            }
        }
    }
}

/// Parameters for one named effect: an intensity knob plus free-form
/// kind-specific values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectParameters {
    /// External intensity knob (0-100)
    #[serde(default)]
    pub intensity: f32,
    /// Kind-specific knobs keyed by camelCase name
    #[serde(flatten)]
    pub knobs: BTreeMap<String, ParameterValue>,
}

impl EffectParameters {
    /// Create parameters with just an intensity (0-100)
    pub fn with_intensity(intensity: f32) -> Self {
        Self {
            intensity,
            knobs: BTreeMap::new(),
        }
    }

    /// Builder-style knob setter
    pub fn knob(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.knobs.insert(name.into(), value);
        self
    }

    /// Intensity mapped from the 0-100 knob onto [0, 1].
    pub fn normalized_intensity(&self) -> f32 {
        if self.intensity.is_nan() {
            return 0.0;
        }
        (self.intensity / 100.0).clamp(0.0, 1.0)
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.knobs
            .get(name)
            .and_then(ParameterValue::as_f32)
            .filter(|v| v.is_finite())
    }

    pub fn get_rgb(&self, name: &str) -> Option<[f32; 3]> {
        self.knobs.get(name).and_then(ParameterValue::as_rgb)
    }
}

/// Mapping from effect name to its parameters, as produced by the host UI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectParameterStore {
    effects: BTreeMap<String, EffectParameters>,
}

impl EffectParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store from the host's JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set (or replace) the parameters for an effect name
    pub fn set(&mut self, name: impl Into<String>, params: EffectParameters) {
        self.effects.insert(name.into(), params);
    }

    /// Builder-style variant of `set`
    pub fn with(mut self, name: impl Into<String>, params: EffectParameters) -> Self {
        self.set(name, params);
        self
    }

    /// Set only the intensity (0-100) of an effect name
    pub fn set_intensity(&mut self, name: &str, intensity: f32) {
        self.effects
            .entry(name.to_string())
            .or_default()
            .intensity = intensity;
    }

    pub fn get(&self, name: &str) -> Option<&EffectParameters> {
        self.effects.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<EffectParameters> {
        self.effects.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EffectParameters)> {
        self.effects.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Content hash used to memoize layer resolution.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for (name, params) in &self.effects {
            name.hash(&mut hasher);
            params.intensity.to_bits().hash(&mut hasher);
            for (knob, value) in &params.knobs {
                knob.hash(&mut hasher);
                value.hash_into(&mut hasher);
            }
        }
        hasher.finish()
    }
}

// ============================================================================
// Typed knobs
// ============================================================================

pub const CHROME_TINT: [f32; 3] = [0.9, 0.91, 0.93];
pub const GOLD_TINT: [f32; 3] = [1.0, 0.78, 0.34];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolographicKnobs {
    /// Hue spread multiplier (default 1.0, 0-3)
    pub rainbow_spread: f32,
    /// Spatial frequency of the film-thickness oscillation (default 1.0, 0.1-5)
    pub interference_scale: f32,
    /// Mean film thickness in nanometres (default 400, 100-1000)
    pub film_thickness_nm: f32,
    /// Fresnel exponent (default 2.0, 0.5-8)
    pub fresnel_power: f32,
    /// Animation speed (default 1.0, 0-4)
    pub speed: f32,
}

impl Default for HolographicKnobs {
    fn default() -> Self {
        Self {
            rainbow_spread: 1.0,
            interference_scale: 1.0,
            film_thickness_nm: 400.0,
            fresnel_power: 2.0,
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetallicKnobs {
    /// Brush direction in degrees (default 45, 0-180)
    pub brush_angle_deg: f32,
    /// Fine brush lines per UV unit (default 180, 10-1000)
    pub brush_density: f32,
    /// Strength of the anisotropic highlight band (default 0.8, 0-1)
    pub anisotropy: f32,
    /// Metal tint (chrome by default, gold for the "gold" alias)
    pub tint: [f32; 3],
}

impl Default for MetallicKnobs {
    fn default() -> Self {
        Self {
            brush_angle_deg: 45.0,
            brush_density: 180.0,
            anisotropy: 0.8,
            tint: CHROME_TINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismaticKnobs {
    /// Base index of refraction (default 1.5, 1.0-3.0)
    pub ior: f32,
    /// IOR spread between channels (default 0.04, 0-0.3)
    pub dispersion: f32,
    /// UV displacement scale of the refracted lookup (default 0.1, 0-1)
    pub refraction_strength: f32,
}

impl Default for PrismaticKnobs {
    fn default() -> Self {
        Self {
            ior: 1.5,
            dispersion: 0.04,
            refraction_strength: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyKnobs {
    /// Noise octaves (default 5, 1-8)
    pub octaves: u32,
    /// Spiral arm count (default 3, 1-8)
    pub arms: u32,
    /// Angular twist per unit radius (default 4.0, 0-12)
    pub swirl: f32,
    /// Fraction of the noise field lit as stars (default 0.02, 0-0.2)
    pub star_density: f32,
    pub core_color: [f32; 3],
    pub arm_color: [f32; 3],
}

impl Default for GalaxyKnobs {
    fn default() -> Self {
        Self {
            octaves: 5,
            arms: 3,
            swirl: 4.0,
            star_density: 0.02,
            core_color: [1.0, 0.8, 0.95],
            arm_color: [0.3, 0.25, 0.85],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalKnobs {
    /// Index of refraction (default 2.42, 1.0-3.0)
    pub ior: f32,
    /// Facet cells per UV unit (default 8, 1-32)
    pub facet_scale: f32,
    /// Sparkle amount (default 0.6, 0-1)
    pub sparkle: f32,
}

impl Default for CrystalKnobs {
    fn default() -> Self {
        Self {
            ior: 2.42,
            facet_scale: 8.0,
            sparkle: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRareKnobs {
    /// Emboss highlight strength (default 0.5, 0-2)
    pub emboss_strength: f32,
    /// Foil animation speed (default 1.0, 0-4)
    pub foil_speed: f32,
    /// Hue spread of the holographic foil (default 1.0, 0-3)
    pub rainbow_spread: f32,
    /// Vertex displacement amplitude in world units (default 0.002, 0-0.02)
    pub displacement: f32,
    pub primary_color: [f32; 3],
    pub secondary_color: [f32; 3],
}

impl Default for SecretRareKnobs {
    fn default() -> Self {
        Self {
            emboss_strength: 0.5,
            foil_speed: 1.0,
            rainbow_spread: 1.0,
            displacement: 0.002,
            primary_color: [1.0, 0.84, 0.45],
            secondary_color: [0.7, 0.85, 1.0],
        }
    }
}

/// Kind-specific knob set with defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKnobs {
    Holographic(HolographicKnobs),
    Metallic(MetallicKnobs),
    Prismatic(PrismaticKnobs),
    Galaxy(GalaxyKnobs),
    Crystal(CrystalKnobs),
    SecretRare(SecretRareKnobs),
}

impl EffectKnobs {
    /// Documented defaults for a kind
    pub fn defaults(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Holographic => EffectKnobs::Holographic(HolographicKnobs::default()),
            EffectKind::Metallic => EffectKnobs::Metallic(MetallicKnobs::default()),
            EffectKind::Prismatic => EffectKnobs::Prismatic(PrismaticKnobs::default()),
            EffectKind::Galaxy => EffectKnobs::Galaxy(GalaxyKnobs::default()),
            EffectKind::Crystal => EffectKnobs::Crystal(CrystalKnobs::default()),
            EffectKind::SecretRare => EffectKnobs::SecretRare(SecretRareKnobs::default()),
        }
    }

    /// Read knobs for `kind` from host parameters, clamping to documented
    /// ranges and falling back to defaults when absent. `alias` is the key
    /// the parameters were found under.
    pub fn from_parameters(kind: EffectKind, alias: &str, params: &EffectParameters) -> Self {
        let f = |name: &str, default: f32, min: f32, max: f32| {
            params.get_f32(name).map_or(default, |v| v.clamp(min, max))
        };
        let rgb = |name: &str, default: [f32; 3]| {
            params
                .get_rgb(name)
                .map_or(default, |c| c.map(|v| v.clamp(0.0, 1.0)))
        };

        match kind {
            EffectKind::Holographic => {
                let d = HolographicKnobs::default();
                EffectKnobs::Holographic(HolographicKnobs {
                    rainbow_spread: f("rainbowSpread", d.rainbow_spread, 0.0, 3.0),
                    interference_scale: f("interferenceScale", d.interference_scale, 0.1, 5.0),
                    film_thickness_nm: f("filmThickness", d.film_thickness_nm, 100.0, 1000.0),
                    fresnel_power: f("fresnelPower", d.fresnel_power, 0.5, 8.0),
                    speed: f("speed", d.speed, 0.0, 4.0),
                })
            }
            EffectKind::Metallic => {
                let d = MetallicKnobs::default();
                let default_tint = if alias == "gold" { GOLD_TINT } else { CHROME_TINT };
                EffectKnobs::Metallic(MetallicKnobs {
                    brush_angle_deg: f("brushAngle", d.brush_angle_deg, 0.0, 180.0),
                    brush_density: f("brushDensity", d.brush_density, 10.0, 1000.0),
                    anisotropy: f("anisotropy", d.anisotropy, 0.0, 1.0),
                    tint: rgb("tint", default_tint),
                })
            }
            EffectKind::Prismatic => {
                let d = PrismaticKnobs::default();
                EffectKnobs::Prismatic(PrismaticKnobs {
                    ior: f("refractiveIndex", d.ior, 1.0, 3.0),
                    dispersion: f("dispersion", d.dispersion, 0.0, 0.3),
                    refraction_strength: f("refractionStrength", d.refraction_strength, 0.0, 1.0),
                })
            }
            EffectKind::Galaxy => {
                let d = GalaxyKnobs::default();
                EffectKnobs::Galaxy(GalaxyKnobs {
                    octaves: f("octaves", d.octaves as f32, 1.0, 8.0).round() as u32,
                    arms: f("arms", d.arms as f32, 1.0, 8.0).round() as u32,
                    swirl: f("swirl", d.swirl, 0.0, 12.0),
                    star_density: f("starDensity", d.star_density, 0.0, 0.2),
                    core_color: rgb("coreColor", d.core_color),
                    arm_color: rgb("armColor", d.arm_color),
                })
            }
            EffectKind::Crystal => {
                let d = CrystalKnobs::default();
                EffectKnobs::Crystal(CrystalKnobs {
                    ior: f("refractiveIndex", d.ior, 1.0, 3.0),
                    facet_scale: f("facetScale", d.facet_scale, 1.0, 32.0),
                    sparkle: f("sparkle", d.sparkle, 0.0, 1.0),
                })
            }
            EffectKind::SecretRare => {
                let d = SecretRareKnobs::default();
                EffectKnobs::SecretRare(SecretRareKnobs {
                    emboss_strength: f("embossStrength", d.emboss_strength, 0.0, 2.0),
                    foil_speed: f("foilSpeed", d.foil_speed, 0.0, 4.0),
                    rainbow_spread: f("rainbowSpread", d.rainbow_spread, 0.0, 3.0),
                    displacement: f("displacement", d.displacement, 0.0, 0.02),
                    primary_color: rgb("primaryColor", d.primary_color),
                    secondary_color: rgb("secondaryColor", d.secondary_color),
                })
            }
        }
    }

    /// The kind these knobs belong to
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectKnobs::Holographic(_) => EffectKind::Holographic,
            EffectKnobs::Metallic(_) => EffectKind::Metallic,
            EffectKnobs::Prismatic(_) => EffectKind::Prismatic,
            EffectKnobs::Galaxy(_) => EffectKind::Galaxy,
            EffectKnobs::Crystal(_) => EffectKind::Crystal,
            EffectKnobs::SecretRare(_) => EffectKind::SecretRare,
        }
    }
}
