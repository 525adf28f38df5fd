//! Reference optics
//!
//! CPU implementations of the math the effect shaders evaluate per
//! fragment. The procedural atlas is generated from these functions and the
//! WGSL sources in `shaders/effects/` mirror them line for line, so the
//! numbers here are the contract both paths share.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

/// Visible band used by the spectral mapping (nanometres)
pub const VISIBLE_MIN_NM: f32 = 380.0;
pub const VISIBLE_MAX_NM: f32 = 750.0;

/// Piecewise-linear wavelength → linear RGB over the visible band, with
/// intensity falloff near both ends. Wavelengths outside the band are black.
pub fn wavelength_to_rgb(nm: f32) -> Vec3 {
    let (r, g, b) = if (380.0..440.0).contains(&nm) {
        (-(nm - 440.0) / (440.0 - 380.0), 0.0, 1.0)
    } else if (440.0..490.0).contains(&nm) {
        (0.0, (nm - 440.0) / (490.0 - 440.0), 1.0)
    } else if (490.0..510.0).contains(&nm) {
        (0.0, 1.0, -(nm - 510.0) / (510.0 - 490.0))
    } else if (510.0..580.0).contains(&nm) {
        ((nm - 510.0) / (580.0 - 510.0), 1.0, 0.0)
    } else if (580.0..645.0).contains(&nm) {
        (1.0, -(nm - 645.0) / (645.0 - 580.0), 0.0)
    } else if (645.0..=VISIBLE_MAX_NM).contains(&nm) {
        (1.0, 0.0, 0.0)
    } else {
        (0.0, 0.0, 0.0)
    };

    let falloff = if (380.0..420.0).contains(&nm) {
        0.3 + 0.7 * (nm - 380.0) / (420.0 - 380.0)
    } else if (700.0..=VISIBLE_MAX_NM).contains(&nm) {
        0.3 + 0.7 * (VISIBLE_MAX_NM - nm) / (VISIBLE_MAX_NM - 700.0)
    } else {
        1.0
    };

    Vec3::new(r, g, b) * falloff
}

/// Fresnel weight: `(1 - max(0, view·normal))^power`.
pub fn fresnel(view: Vec3, normal: Vec3, power: f32) -> f32 {
    (1.0 - view.dot(normal).max(0.0)).powf(power)
}

/// Optical path difference of a thin film: `2 · thickness · cos(θ)`.
pub fn thin_film_path(thickness_nm: f32, cos_theta: f32) -> f32 {
    2.0 * thickness_nm * cos_theta
}

/// Film thickness oscillating across the surface and over time.
pub fn film_thickness(uv: Vec2, time: f32, base_nm: f32, scale: f32, speed: f32) -> f32 {
    let phase = TAU * scale * (uv.x + 0.6 * uv.y) + time * speed;
    base_nm * (0.75 + 0.25 * phase.sin())
}

/// Map an optical path length onto a visible wavelength.
pub fn path_to_wavelength(path_nm: f32, spread: f32) -> f32 {
    let band = VISIBLE_MAX_NM - VISIBLE_MIN_NM;
    VISIBLE_MIN_NM + (path_nm * spread).rem_euclid(band)
}

/// Holographic thin-film color for one surface point.
#[allow(clippy::too_many_arguments)]
pub fn thin_film_color(
    uv: Vec2,
    view: Vec3,
    normal: Vec3,
    time: f32,
    base_nm: f32,
    scale: f32,
    speed: f32,
    spread: f32,
    fresnel_power: f32,
) -> Vec3 {
    let cos_theta = view.dot(normal).max(0.0);
    let thickness = film_thickness(uv, time, base_nm, scale, speed);
    let path = thin_film_path(thickness, cos_theta);
    let color = wavelength_to_rgb(path_to_wavelength(path, spread));
    // Keep a floor so head-on views still show some foil
    color * (0.35 + 0.65 * fresnel(view, normal, fresnel_power))
}

/// GLSL-style refraction of incident direction `i` through normal `n`
/// with relative index `eta`. Total internal reflection yields zero.
pub fn refract(i: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_i = n.dot(i);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        eta * i - (eta * cos_i + k.sqrt()) * n
    }
}

/// Refract the view vector once per color channel using the indices
/// `ior - delta`, `ior`, `ior + delta` (R, G, B).
pub fn dispersion(incident: Vec3, normal: Vec3, ior: f32, delta: f32) -> [Vec3; 3] {
    [ior - delta, ior, ior + delta].map(|channel_ior| refract(incident, normal, 1.0 / channel_ior.max(1e-3)))
}

/// Anisotropic brushed-metal response.
///
/// A linear highlight band oriented by `angle` (radians) times a repeating
/// fine-line texture running along the brush direction.
pub fn brushed_metal(uv: Vec2, angle: f32, density: f32, anisotropy: f32, light_offset: f32) -> f32 {
    let dir = Vec2::new(angle.cos(), angle.sin());
    let across = Vec2::new(-dir.y, dir.x);
    let along = uv.dot(dir) + light_offset;
    let band = 1.0 - (2.0 * along.rem_euclid(1.0) - 1.0).abs();
    let lines = 0.5 + 0.5 * (uv.dot(across) * density * TAU).sin();
    let highlight = band * anisotropy + (1.0 - anisotropy) * 0.5;
    highlight * (0.65 + 0.35 * lines)
}

/// Hash of a 2D point into [0, 1).
pub fn hash2(p: Vec2) -> f32 {
    let h = (p.dot(Vec2::new(127.1, 311.7))).sin() * 43_758.547;
    h - h.floor()
}

/// Bilinear value noise with smoothstep interpolation, in [0, 1).
pub fn value_noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);
    let a = hash2(i);
    let b = hash2(i + Vec2::new(1.0, 0.0));
    let c = hash2(i + Vec2::new(0.0, 1.0));
    let d = hash2(i + Vec2::new(1.0, 1.0));
    let ab = a + (b - a) * u.x;
    let cd = c + (d - c) * u.x;
    ab + (cd - ab) * u.y
}

/// Fractal Brownian motion: sum of `octaves` noise octaves with halving
/// amplitude and doubling frequency.
pub fn fbm(p: Vec2, octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    for _ in 0..octaves.clamp(1, 8) {
        sum += amplitude * value_noise(p * frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    sum
}

/// Galaxy foil color: fbm-driven spiral banding plus thresholded stars.
#[allow(clippy::too_many_arguments)]
pub fn galaxy_color(
    uv: Vec2,
    time: f32,
    octaves: u32,
    arms: u32,
    swirl: f32,
    star_density: f32,
    core_color: Vec3,
    arm_color: Vec3,
) -> Vec3 {
    let p = uv - Vec2::splat(0.5);
    let radius = p.length();
    let angle = p.y.atan2(p.x);
    let noise = fbm(uv * 4.0 + Vec2::splat(time * 0.05), octaves);
    let spiral = 0.5 + 0.5 * (arms as f32 * angle + swirl * radius * TAU - time * 0.2 + noise * 2.0).sin();
    let falloff = (1.0 - radius * 1.6).clamp(0.0, 1.0);
    let band = spiral * falloff * (0.6 + 0.4 * noise);
    let core = (1.0 - radius * 4.0).clamp(0.0, 1.0);
    let star = if hash2((uv * 256.0).floor()) > 1.0 - star_density {
        1.0
    } else {
        0.0
    };
    arm_color * band + core_color * core + Vec3::splat(star)
}

/// Sinusoidal emboss height field used by the secret-rare displacement.
pub fn emboss_height(uv: Vec2, time: f32) -> f32 {
    (uv.x * 6.0 * TAU + time).sin() * (uv.y * 8.0 * TAU).sin() * 0.5 + 0.5
}

/// Tangent-space normal derived from the emboss height field by central
/// differences.
pub fn emboss_normal(uv: Vec2, time: f32, strength: f32) -> Vec3 {
    const EPS: f32 = 1.0 / 512.0;
    let gx = (emboss_height(uv + Vec2::new(EPS, 0.0), time) - emboss_height(uv - Vec2::new(EPS, 0.0), time)) / (2.0 * EPS);
    let gy = (emboss_height(uv + Vec2::new(0.0, EPS), time) - emboss_height(uv - Vec2::new(0.0, EPS), time)) / (2.0 * EPS);
    let scale = strength * 0.1;
    Vec3::new(-gx * scale, -gy * scale, 1.0).normalize()
}
