//! Layer resolution
//!
//! Turns an [`EffectParameterStore`] into the ordered list of active
//! [`EffectLayer`]s. Resolution is a pure function of the store; the
//! resolver only adds a one-entry memo keyed by the store fingerprint so
//! unchanged parameters do not rebuild the material graph.

use std::sync::Arc;

use crate::compositor::EffectLayer;

use super::{EffectKind, EffectKnobs, EffectParameterStore, EffectParameters};

/// Resolves parameter stores into sorted effect layers.
#[derive(Debug, Default)]
pub struct LayerResolver {
    cached: Option<(u64, Arc<[EffectLayer]>)>,
}

impl LayerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the active layers for a parameter store.
    ///
    /// Keys that are not a known effect name are ignored. Output is sorted
    /// ascending by z-order.
    pub fn resolve(params: &EffectParameterStore) -> Vec<EffectLayer> {
        for (name, _) in params.iter() {
            if EffectKind::from_name(name).is_none() {
                tracing::debug!(
                    target: "foilcard::effects",
                    key = name,
                    "Ignoring unknown effect parameter key"
                );
            }
        }

        let mut layers: Vec<EffectLayer> = EffectKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let (alias, entry) = Self::strongest_alias(kind, params)?;
                let knobs = EffectKnobs::from_parameters(kind, alias, entry);
                EffectLayer::new(kind, entry.normalized_intensity(), knobs)
            })
            .collect();

        layers.sort_by_key(|layer| layer.z_order);
        layers
    }

    /// Memoized variant of [`LayerResolver::resolve`].
    ///
    /// Returns the previous result when the store content is unchanged.
    pub fn resolve_cached(&mut self, params: &EffectParameterStore) -> Arc<[EffectLayer]> {
        let fingerprint = params.fingerprint();
        if let Some((cached_fingerprint, layers)) = &self.cached {
            if *cached_fingerprint == fingerprint {
                return Arc::clone(layers);
            }
        }

        let layers: Arc<[EffectLayer]> = Self::resolve(params).into();
        tracing::debug!(
            target: "foilcard::effects",
            active = layers.len(),
            "Resolved effect layers"
        );
        self.cached = Some((fingerprint, Arc::clone(&layers)));
        layers
    }

    /// Drop the memoized result
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Pick the alias entry with the highest intensity for a kind.
    /// Ties keep the earlier alias.
    fn strongest_alias<'a>(
        kind: EffectKind,
        params: &'a EffectParameterStore,
    ) -> Option<(&'static str, &'a EffectParameters)> {
        let mut best: Option<(&'static str, &'a EffectParameters)> = None;
        for &alias in kind.aliases() {
            let Some(entry) = params.get(alias) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, current)) => {
                    entry.normalized_intensity() > current.normalized_intensity()
                }
            };
            if better {
                best = Some((alias, entry));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{BlendMode, ZOrder};
    use crate::effects::{MetallicKnobs, GOLD_TINT};

    fn store(entries: &[(&str, f32)]) -> EffectParameterStore {
        let mut store = EffectParameterStore::new();
        for (name, intensity) in entries {
            store.set(*name, EffectParameters::with_intensity(*intensity));
        }
        store
    }

    #[test]
    fn test_resolve_empty() {
        assert!(LayerResolver::resolve(&EffectParameterStore::new()).is_empty());
    }

    #[test]
    fn test_resolve_sorted_by_z_order() {
        let params = store(&[
            ("secretRare", 10.0),
            ("galaxy", 30.0),
            ("holographic", 50.0),
            ("crystal", 70.0),
            ("prismatic", 90.0),
            ("metallic", 20.0),
        ]);
        let layers = LayerResolver::resolve(&params);
        assert_eq!(layers.len(), 6);
        for pair in layers.windows(2) {
            assert!(pair[0].z_order < pair[1].z_order);
        }
        assert_eq!(layers[0].kind, EffectKind::Holographic);
        assert_eq!(layers[5].kind, EffectKind::SecretRare);
    }

    #[test]
    fn test_zero_intensity_excluded() {
        let params = store(&[("holographic", 0.0), ("galaxy", 25.0)]);
        let layers = LayerResolver::resolve(&params);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].kind, EffectKind::Galaxy);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let params = store(&[("sparkles", 90.0), ("crystal", 40.0)]);
        let layers = LayerResolver::resolve(&params);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].kind, EffectKind::Crystal);
        assert!((layers[0].opacity - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_chrome_alias_resolves_metallic() {
        let params = store(&[("holographic", 80.0), ("chrome", 60.0)]);
        let layers = LayerResolver::resolve(&params);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].z_order, ZOrder::HOLOGRAPHIC);
        assert_eq!(layers[1].kind, EffectKind::Metallic);
        assert_eq!(layers[1].id, "metallic");
        assert_eq!(layers[1].blend_mode, BlendMode::Overlay);
        assert!((layers[1].intensity - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_strongest_alias_wins() {
        let params = store(&[("chrome", 30.0), ("gold", 70.0)]);
        let layers = LayerResolver::resolve(&params);
        assert_eq!(layers.len(), 1);
        assert!((layers[0].intensity - 0.7).abs() < 1e-6);
        match &layers[0].knobs {
            EffectKnobs::Metallic(MetallicKnobs { tint, .. }) => assert_eq!(*tint, GOLD_TINT),
            other => panic!("unexpected knobs {other:?}"),
        }
    }

    #[test]
    fn test_resolve_idempotent() {
        let params = store(&[("galaxy", 45.0), ("prismatic", 12.0)]);
        assert_eq!(LayerResolver::resolve(&params), LayerResolver::resolve(&params));
    }

    #[test]
    fn test_resolve_cached_reuses_result() {
        let mut resolver = LayerResolver::new();
        let params = store(&[("galaxy", 45.0)]);
        let first = resolver.resolve_cached(&params);
        let second = resolver.resolve_cached(&params.clone());
        assert!(Arc::ptr_eq(&first, &second));

        let changed = store(&[("galaxy", 46.0)]);
        let third = resolver.resolve_cached(&changed);
        assert!(!Arc::ptr_eq(&first, &third));

        resolver.invalidate();
        let fourth = resolver.resolve_cached(&changed);
        assert!(!Arc::ptr_eq(&third, &fourth));
        assert_eq!(*third, *fourth);
    }
}
