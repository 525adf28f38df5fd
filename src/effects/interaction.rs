//! Cross-effect interaction modifiers
//!
//! Some effect pairs amplify each other when both are active. The modifiers
//! computed here feed auxiliary lighting and compositing boosts; they never
//! change the layer intensities themselves.

use serde::{Deserialize, Serialize};

use crate::compositor::EffectLayer;

use super::EffectKind;

/// Names of the derived modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierKind {
    /// holographic × metallic
    RainbowEnhancement,
    /// prismatic × crystal
    DispersionBoost,
}

impl ModifierKind {
    pub fn name(self) -> &'static str {
        match self {
            ModifierKind::RainbowEnhancement => "rainbowEnhancement",
            ModifierKind::DispersionBoost => "dispersionBoost",
        }
    }
}

/// A derived amplifier for a pair of simultaneously-active kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionModifier {
    pub kind: ModifierKind,
    pub factor: f32,
}

/// One pair rule: both kinds must be active for the rule to fire.
struct InteractionRule {
    modifier: ModifierKind,
    pair: (EffectKind, EffectKind),
    formula: fn(f32, f32) -> f32,
}

const RULES: &[InteractionRule] = &[
    InteractionRule {
        modifier: ModifierKind::RainbowEnhancement,
        pair: (EffectKind::Holographic, EffectKind::Metallic),
        formula: |holo, metallic| (1.0 + holo * metallic).min(1.5),
    },
    InteractionRule {
        modifier: ModifierKind::DispersionBoost,
        pair: (EffectKind::Prismatic, EffectKind::Crystal),
        formula: |prismatic, crystal| (1.0 + prismatic * crystal * 0.8).min(2.0),
    },
];

/// The modifiers active for the current layer set.
///
/// A modifier is present only when its rule fired; absent modifiers are
/// not represented by a neutral value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interactions {
    modifiers: Vec<InteractionModifier>,
}

impl Interactions {
    pub fn get(&self, kind: ModifierKind) -> Option<f32> {
        self.modifiers
            .iter()
            .find(|m| m.kind == kind)
            .map(|m| m.factor)
    }

    /// Look up a modifier by its external name
    pub fn get_named(&self, name: &str) -> Option<f32> {
        self.modifiers
            .iter()
            .find(|m| m.kind.name() == name)
            .map(|m| m.factor)
    }

    pub fn contains(&self, kind: ModifierKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionModifier> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Combined multiplier for the auxiliary light (1.0 when nothing fired).
    pub fn light_boost(&self) -> f32 {
        self.modifiers.iter().map(|m| m.factor).product()
    }
}

/// Evaluates the fixed pair rules over resolved layers.
pub struct InteractionResolver;

impl InteractionResolver {
    pub fn resolve(layers: &[EffectLayer]) -> Interactions {
        let intensity = |kind: EffectKind| {
            layers
                .iter()
                .find(|layer| layer.kind == kind)
                .map(|layer| layer.intensity)
                .filter(|i| *i > 0.0)
        };

        let modifiers = RULES
            .iter()
            .filter_map(|rule| {
                let a = intensity(rule.pair.0)?;
                let b = intensity(rule.pair.1)?;
                Some(InteractionModifier {
                    kind: rule.modifier,
                    factor: (rule.formula)(a, b),
                })
            })
            .collect();

        Interactions { modifiers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKnobs;

    fn layer(kind: EffectKind, intensity: f32) -> EffectLayer {
        EffectLayer::new(kind, intensity, EffectKnobs::defaults(kind)).unwrap()
    }

    #[test]
    fn test_no_layers_no_modifiers() {
        let interactions = InteractionResolver::resolve(&[]);
        assert!(interactions.is_empty());
        assert_eq!(interactions.light_boost(), 1.0);
    }

    #[test]
    fn test_rainbow_enhancement() {
        let layers = [layer(EffectKind::Holographic, 0.8), layer(EffectKind::Metallic, 0.6)];
        let interactions = InteractionResolver::resolve(&layers);
        let factor = interactions.get(ModifierKind::RainbowEnhancement).unwrap();
        assert!((factor - 1.48).abs() < 1e-5);
        assert_eq!(interactions.get_named("rainbowEnhancement"), Some(factor));
        assert!(!interactions.contains(ModifierKind::DispersionBoost));
    }

    #[test]
    fn test_rainbow_enhancement_capped() {
        let layers = [layer(EffectKind::Holographic, 1.0), layer(EffectKind::Metallic, 1.0)];
        let interactions = InteractionResolver::resolve(&layers);
        assert_eq!(interactions.get(ModifierKind::RainbowEnhancement), Some(1.5));
    }

    #[test]
    fn test_rule_skipped_when_partner_absent() {
        let layers = [layer(EffectKind::Holographic, 1.0), layer(EffectKind::Crystal, 1.0)];
        let interactions = InteractionResolver::resolve(&layers);
        assert!(interactions.is_empty());
    }

    #[test]
    fn test_dispersion_boost() {
        let layers = [layer(EffectKind::Prismatic, 0.5), layer(EffectKind::Crystal, 0.5)];
        let interactions = InteractionResolver::resolve(&layers);
        let factor = interactions.get(ModifierKind::DispersionBoost).unwrap();
        assert!((factor - 1.2).abs() < 1e-5);
        assert!((interactions.light_boost() - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_layers_untouched() {
        let layers = vec![layer(EffectKind::Holographic, 0.8), layer(EffectKind::Metallic, 0.6)];
        let before = layers.clone();
        let _ = InteractionResolver::resolve(&layers);
        assert_eq!(layers, before);
    }
}
