//! Procedural fallback atlas
//!
//! A square RGBA texture split into four quadrants that fallback materials
//! sample instead of running a live shader:
//!
//! | quadrant | content |
//! |---|---|
//! | 0 (top-left) | thin-film interference |
//! | 1 (top-right) | brushed metal |
//! | 2 (bottom-left) | galaxy swirl with stars |
//! | 3 (bottom-right) | emboss normal map |
//!
//! Atlases are generated once per `(kind-set, tier)` and shared through
//! [`AtlasCache`]. The cache never drops an entry implicitly; callers
//! release entries on tier changes and on teardown.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::effects::{EffectKind, GalaxyKnobs, HolographicKnobs, KindSet, MetallicKnobs};
use crate::optics;
use crate::quality::{QualityProfile, QualityTier};

/// Seed for the star field so atlases are reproducible
const STAR_SEED: u64 = 0x5EED_F011;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    Interference,
    BrushedMetal,
    Galaxy,
    NormalMap,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Interference,
        Quadrant::BrushedMetal,
        Quadrant::Galaxy,
        Quadrant::NormalMap,
    ];

    pub fn index(self) -> u32 {
        match self {
            Quadrant::Interference => 0,
            Quadrant::BrushedMetal => 1,
            Quadrant::Galaxy => 2,
            Quadrant::NormalMap => 3,
        }
    }

    /// The quadrant a kind's fallback material samples
    pub fn for_kind(kind: EffectKind) -> Quadrant {
        match kind {
            EffectKind::Holographic | EffectKind::Prismatic | EffectKind::SecretRare => {
                Quadrant::Interference
            }
            EffectKind::Metallic => Quadrant::BrushedMetal,
            EffectKind::Galaxy => Quadrant::Galaxy,
            EffectKind::Crystal => Quadrant::NormalMap,
        }
    }

    /// UV rectangle of the quadrant within the atlas
    pub fn region(self) -> AtlasRegion {
        let i = self.index();
        AtlasRegion {
            offset: [(i % 2) as f32 * 0.5, (i / 2) as f32 * 0.5],
            scale: [0.5, 0.5],
        }
    }

    /// Pixel origin of the quadrant in an atlas of edge `size`
    fn origin(self, size: u32) -> (u32, u32) {
        let half = size / 2;
        let i = self.index();
        ((i % 2) * half, (i / 2) * half)
    }
}

/// UV sub-rectangle: `uv' = offset + uv * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRegion {
    pub offset: [f32; 2],
    pub scale: [f32; 2],
}

/// Cache key: the set of active kinds and the effective tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasKey {
    pub kinds: KindSet,
    pub tier: QualityTier,
}

impl AtlasKey {
    pub fn new(kinds: KindSet, tier: QualityTier) -> Self {
        Self { kinds, tier }
    }

    /// Whether a quadrant carries content for this key
    pub fn needs(&self, quadrant: Quadrant) -> bool {
        quadrant == Quadrant::NormalMap || self.kinds.iter().any(|k| Quadrant::for_kind(k) == quadrant)
    }
}

/// A generated atlas image.
pub struct ProceduralAtlas {
    key: AtlasKey,
    image: RgbaImage,
}

impl std::fmt::Debug for ProceduralAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProceduralAtlas")
            .field("key", &self.key)
            .field("size", &self.size())
            .finish()
    }
}

impl ProceduralAtlas {
    /// Generate the atlas for `key` at `size` x `size` pixels.
    ///
    /// Quadrants no active kind samples stay fully transparent.
    pub fn generate(key: AtlasKey, size: u32) -> Self {
        let size = size.max(2) & !1;
        let mut image = RgbaImage::new(size, size);
        let half = size / 2;

        for quadrant in Quadrant::ALL {
            if !key.needs(quadrant) {
                continue;
            }
            let (ox, oy) = quadrant.origin(size);
            match quadrant {
                Quadrant::Interference => fill_interference(&mut image, ox, oy, half),
                Quadrant::BrushedMetal => fill_brushed_metal(&mut image, ox, oy, half),
                Quadrant::Galaxy => fill_galaxy(&mut image, ox, oy, half),
                Quadrant::NormalMap => fill_normal_map(&mut image, ox, oy, half),
            }
        }

        tracing::debug!(
            target: "foilcard::atlas",
            size,
            kinds = key.kinds.len(),
            tier = %key.tier,
            "Procedural atlas generated"
        );

        Self { key, image }
    }

    pub fn key(&self) -> AtlasKey {
        self.key
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Pixel at `(x, y)` local to a quadrant
    pub fn quadrant_pixel(&self, quadrant: Quadrant, x: u32, y: u32) -> Option<Rgba<u8>> {
        let half = self.size() / 2;
        if x >= half || y >= half {
            return None;
        }
        let (ox, oy) = quadrant.origin(self.size());
        Some(*self.image.get_pixel(ox + x, oy + y))
    }

    /// Whether any pixel of the quadrant is non-transparent
    pub fn has_content(&self, quadrant: Quadrant) -> bool {
        let half = self.size() / 2;
        let (ox, oy) = quadrant.origin(self.size());
        (0..half).any(|y| (0..half).any(|x| self.image.get_pixel(ox + x, oy + y)[3] > 0))
    }
}

fn to_rgba(color: Vec3, alpha: f32) -> Rgba<u8> {
    let c = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    Rgba([
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

fn local_uv(x: u32, y: u32, half: u32) -> Vec2 {
    Vec2::new((x as f32 + 0.5) / half as f32, (y as f32 + 0.5) / half as f32)
}

fn fill_interference(image: &mut RgbaImage, ox: u32, oy: u32, half: u32) {
    let knobs = HolographicKnobs::default();
    for y in 0..half {
        for x in 0..half {
            let uv = local_uv(x, y, half);
            // Sweep the view angle across the quadrant so the baked film
            // covers the full hue range
            let tilt = (uv.y - 0.5) * 1.4;
            let view = Vec3::new(0.0, tilt, 1.0).normalize();
            let color = optics::thin_film_color(
                uv,
                view,
                Vec3::Z,
                0.0,
                knobs.film_thickness_nm,
                knobs.interference_scale,
                knobs.speed,
                knobs.rainbow_spread,
                knobs.fresnel_power,
            );
            image.put_pixel(ox + x, oy + y, to_rgba(color, 1.0));
        }
    }
}

fn fill_brushed_metal(image: &mut RgbaImage, ox: u32, oy: u32, half: u32) {
    let knobs = MetallicKnobs::default();
    let angle = knobs.brush_angle_deg.to_radians();
    for y in 0..half {
        for x in 0..half {
            let uv = local_uv(x, y, half);
            let v = optics::brushed_metal(uv, angle, knobs.brush_density * 0.25, knobs.anisotropy, 0.0);
            image.put_pixel(ox + x, oy + y, to_rgba(Vec3::splat(v), 1.0));
        }
    }
}

fn fill_galaxy(image: &mut RgbaImage, ox: u32, oy: u32, half: u32) {
    let knobs = GalaxyKnobs::default();
    let core = Vec3::from_array(knobs.core_color);
    let arm = Vec3::from_array(knobs.arm_color);
    for y in 0..half {
        for x in 0..half {
            let uv = local_uv(x, y, half);
            // Stars come from the seeded field below, not the hash threshold
            let color = optics::galaxy_color(uv, 0.0, knobs.octaves, knobs.arms, knobs.swirl, 0.0, core, arm);
            image.put_pixel(ox + x, oy + y, to_rgba(color, 1.0));
        }
    }

    let mut rng = StdRng::seed_from_u64(STAR_SEED ^ half as u64);
    let stars = ((half * half) as f32 * knobs.star_density * 0.05).ceil() as u32;
    for _ in 0..stars {
        let x = rng.random_range(0..half);
        let y = rng.random_range(0..half);
        let brightness = 0.6 + 0.4 * rng.random::<f32>();
        image.put_pixel(ox + x, oy + y, to_rgba(Vec3::splat(brightness), 1.0));
    }
}

fn fill_normal_map(image: &mut RgbaImage, ox: u32, oy: u32, half: u32) {
    for y in 0..half {
        for x in 0..half {
            let uv = local_uv(x, y, half);
            let n = optics::emboss_normal(uv, 0.0, 1.0);
            image.put_pixel(ox + x, oy + y, to_rgba(n * 0.5 + Vec3::splat(0.5), 1.0));
        }
    }
}

/// Shares atlases per `(kind-set, tier)`.
#[derive(Debug, Default)]
pub struct AtlasCache {
    entries: HashMap<AtlasKey, Arc<ProceduralAtlas>>,
}

impl AtlasCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached atlas for `key`, generating it at the profile's
    /// atlas size on first use.
    pub fn get_or_create(&mut self, key: AtlasKey, profile: &QualityProfile) -> Arc<ProceduralAtlas> {
        self.entries
            .entry(key)
            .or_insert_with(|| {
                tracing::info!(
                    target: "foilcard::atlas",
                    size = profile.texture_atlas_size,
                    tier = %key.tier,
                    "Creating procedural atlas"
                );
                Arc::new(ProceduralAtlas::generate(key, profile.texture_atlas_size))
            })
            .clone()
    }

    pub fn get(&self, key: &AtlasKey) -> Option<Arc<ProceduralAtlas>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &AtlasKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop one entry. Returns true when it existed.
    pub fn release(&mut self, key: &AtlasKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            log_release(key, "explicit");
        }
        removed
    }

    /// Drop every entry only the cache still holds. Returns the released
    /// keys so GPU copies can be destroyed alongside.
    pub fn release_unreferenced(&mut self) -> Vec<AtlasKey> {
        self.release_where(|_, atlas| Arc::strong_count(atlas) == 1, "unreferenced")
    }

    /// Drop every entry generated for another tier.
    pub fn retain_tier(&mut self, tier: QualityTier) -> Vec<AtlasKey> {
        self.release_where(|key, _| key.tier != tier, "tier change")
    }

    /// Drop everything (teardown).
    pub fn dispose(&mut self) -> Vec<AtlasKey> {
        self.release_where(|_, _| true, "dispose")
    }

    fn release_where(
        &mut self,
        mut predicate: impl FnMut(&AtlasKey, &Arc<ProceduralAtlas>) -> bool,
        reason: &'static str,
    ) -> Vec<AtlasKey> {
        let released: Vec<AtlasKey> = self
            .entries
            .iter()
            .filter(|(key, atlas)| predicate(key, atlas))
            .map(|(key, _)| *key)
            .collect();
        for key in &released {
            self.entries.remove(key);
            log_release(key, reason);
        }
        released
    }
}

fn log_release(key: &AtlasKey, reason: &'static str) {
    tracing::info!(
        target: "foilcard::atlas",
        tier = %key.tier,
        kinds = key.kinds.len(),
        reason,
        "Procedural atlas released"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::DeviceCapabilities;

    fn key(kinds: &[EffectKind], tier: QualityTier) -> AtlasKey {
        AtlasKey::new(kinds.iter().copied().collect(), tier)
    }

    fn profile(tier: QualityTier) -> QualityProfile {
        QualityProfile::for_tier(tier, &DeviceCapabilities::default())
    }

    #[test]
    fn test_quadrant_regions() {
        assert_eq!(Quadrant::Interference.region().offset, [0.0, 0.0]);
        assert_eq!(Quadrant::BrushedMetal.region().offset, [0.5, 0.0]);
        assert_eq!(Quadrant::Galaxy.region().offset, [0.0, 0.5]);
        assert_eq!(Quadrant::NormalMap.region().offset, [0.5, 0.5]);
    }

    #[test]
    fn test_absent_quadrants_transparent() {
        let atlas = ProceduralAtlas::generate(key(&[EffectKind::Holographic], QualityTier::Low), 32);
        assert_eq!(atlas.size(), 32);
        assert!(atlas.has_content(Quadrant::Interference));
        assert!(!atlas.has_content(Quadrant::BrushedMetal));
        assert!(!atlas.has_content(Quadrant::Galaxy));
        assert!(atlas.has_content(Quadrant::NormalMap));
    }

    #[test]
    fn test_all_quadrants_when_all_kinds() {
        let atlas = ProceduralAtlas::generate(key(&EffectKind::ALL, QualityTier::Medium), 32);
        for quadrant in Quadrant::ALL {
            assert!(atlas.has_content(quadrant), "{quadrant:?} should be filled");
        }
    }

    #[test]
    fn test_generation_deterministic() {
        let k = key(&[EffectKind::Galaxy], QualityTier::Low);
        let a = ProceduralAtlas::generate(k, 64);
        let b = ProceduralAtlas::generate(k, 64);
        assert_eq!(a.image().as_raw(), b.image().as_raw());
    }

    #[test]
    fn test_normal_map_points_outward() {
        let atlas = ProceduralAtlas::generate(key(&[], QualityTier::Low), 16);
        let px = atlas.quadrant_pixel(Quadrant::NormalMap, 3, 5).unwrap();
        assert!(px[2] > 128);
        assert!(atlas.quadrant_pixel(Quadrant::NormalMap, 8, 0).is_none());
    }

    #[test]
    fn test_cache_shares_atlas() {
        let mut cache = AtlasCache::new();
        let k = key(&[EffectKind::Metallic], QualityTier::Low);
        let a = cache.get_or_create(k, &profile(QualityTier::Low));
        let b = cache.get_or_create(k, &profile(QualityTier::Low));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.size(), 256);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_release_unreferenced() {
        let mut cache = AtlasCache::new();
        let held = cache.get_or_create(key(&[EffectKind::Galaxy], QualityTier::Low), &profile(QualityTier::Low));
        let dropped_key = key(&[EffectKind::Crystal], QualityTier::Low);
        drop(cache.get_or_create(dropped_key, &profile(QualityTier::Low)));

        let released = cache.release_unreferenced();
        assert_eq!(released, vec![dropped_key]);
        assert!(cache.contains(&held.key()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retain_tier_and_dispose() {
        let mut cache = AtlasCache::new();
        let low = key(&[EffectKind::Holographic], QualityTier::Low);
        let medium = key(&[EffectKind::Holographic], QualityTier::Medium);
        cache.get_or_create(low, &profile(QualityTier::Low));
        cache.get_or_create(medium, &profile(QualityTier::Medium));

        assert_eq!(cache.retain_tier(QualityTier::Medium), vec![low]);
        assert!(cache.contains(&medium));
        assert!(!cache.release(&low));
        assert_eq!(cache.dispose(), vec![medium]);
        assert!(cache.is_empty());
    }
}
