//! Uniform data passed to effect shaders
//!
//! `EffectUniforms` is the single uniform block every effect program binds at
//! `@group(0) @binding(0)`. Shared values (matrices, light, time) come first,
//! followed by 24 kind-specific parameter slots.

use glam::{Mat4, Vec3};

use super::EffectKnobs;

/// Number of kind-specific float slots (6 vec4s).
pub const PARAM_SLOTS: usize = 24;

/// Flag lanes in [`EffectUniforms::flags`].
pub const FLAG_BASE_TEXTURE: usize = 0;
pub const FLAG_ENV_MAP: usize = 1;
pub const FLAG_NORMAL_MAP: usize = 2;
pub const FLAG_SHADER_BLEND_ASSIST: usize = 3;

/// Uniform block laid out for WGSL (all members 16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EffectUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Card transform including the layer's depth offset
    pub model: [[f32; 4]; 4],
    /// xyz = normalized light direction, w = interaction light boost
    pub light_dir: [f32; 4],
    /// xyz = camera position, w unused
    pub camera_pos: [f32; 4],
    /// Seconds since session start (advanced on governor ticks only)
    pub time: f32,
    pub intensity: f32,
    pub opacity: f32,
    /// Fallback color luminance used when the base texture is missing
    pub flat_color: f32,
    /// 1.0 when the corresponding input is bound, see `FLAG_*`
    pub flags: [f32; 4],
    pub params: [f32; PARAM_SLOTS],
}

impl Default for EffectUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            light_dir: [0.0, 0.0, 1.0, 1.0],
            camera_pos: [0.0, 0.0, 5.0, 0.0],
            time: 0.0,
            intensity: 0.0,
            opacity: 0.0,
            flat_color: 0.5,
            flags: [0.0; 4],
            params: [0.0; PARAM_SLOTS],
        }
    }
}

impl EffectUniforms {
    /// Size of the block in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn set_matrices(&mut self, view_proj: Mat4, model: Mat4) {
        self.view_proj = view_proj.to_cols_array_2d();
        self.model = model.to_cols_array_2d();
    }

    pub fn set_light(&mut self, direction: Vec3, boost: f32) {
        let dir = direction.try_normalize().unwrap_or(Vec3::Z);
        self.light_dir = [dir.x, dir.y, dir.z, boost];
    }

    pub fn set_flag(&mut self, lane: usize, on: bool) {
        if lane < self.flags.len() {
            self.flags[lane] = if on { 1.0 } else { 0.0 };
        }
    }

    /// Set a float parameter at the given index
    pub fn set_float(&mut self, index: usize, value: f32) {
        if index < self.params.len() {
            self.params[index] = value;
        }
    }

    /// Set a vec3 parameter starting at the given index
    pub fn set_vec3(&mut self, index: usize, value: [f32; 3]) {
        if index + 2 < self.params.len() {
            self.params[index..index + 3].copy_from_slice(&value);
        }
    }

    /// Pack kind-specific knobs into the parameter slots.
    ///
    /// Slot layout per kind matches the `UniformSchema` of the kind's
    /// shader program.
    pub fn pack_knobs(&mut self, knobs: &EffectKnobs) {
        self.params = [0.0; PARAM_SLOTS];
        match knobs {
            EffectKnobs::Holographic(k) => {
                self.set_float(0, k.rainbow_spread);
                self.set_float(1, k.interference_scale);
                self.set_float(2, k.film_thickness_nm);
                self.set_float(3, k.fresnel_power);
                self.set_float(4, k.speed);
            }
            EffectKnobs::Metallic(k) => {
                self.set_float(0, k.brush_angle_deg.to_radians());
                self.set_float(1, k.brush_density);
                self.set_float(2, k.anisotropy);
                self.set_vec3(4, k.tint);
            }
            EffectKnobs::Prismatic(k) => {
                self.set_float(0, k.ior);
                self.set_float(1, k.dispersion);
                self.set_float(2, k.refraction_strength);
            }
            EffectKnobs::Galaxy(k) => {
                self.set_float(0, k.octaves as f32);
                self.set_float(1, k.arms as f32);
                self.set_float(2, k.swirl);
                self.set_float(3, k.star_density);
                self.set_vec3(4, k.core_color);
                self.set_vec3(8, k.arm_color);
            }
            EffectKnobs::Crystal(k) => {
                self.set_float(0, k.ior);
                self.set_float(1, k.facet_scale);
                self.set_float(2, k.sparkle);
            }
            EffectKnobs::SecretRare(k) => {
                self.set_float(0, k.emboss_strength);
                self.set_float(1, k.foil_speed);
                self.set_float(2, k.rainbow_spread);
                self.set_float(3, k.displacement);
                self.set_vec3(4, k.primary_color);
                self.set_vec3(8, k.secondary_color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectKind, GalaxyKnobs, MetallicKnobs};

    #[test]
    fn test_uniform_size_is_vec4_aligned() {
        assert_eq!(EffectUniforms::SIZE % 16, 0);
        assert_eq!(EffectUniforms::SIZE, 64 + 64 + 16 + 16 + 16 + 16 + 96);
    }

    #[test]
    fn test_set_light_normalizes() {
        let mut u = EffectUniforms::default();
        u.set_light(Vec3::new(0.0, 3.0, 4.0), 1.48);
        assert!((u.light_dir[1] - 0.6).abs() < 1e-6);
        assert!((u.light_dir[2] - 0.8).abs() < 1e-6);
        assert_eq!(u.light_dir[3], 1.48);

        u.set_light(Vec3::ZERO, 1.0);
        assert_eq!(&u.light_dir[..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pack_metallic() {
        let mut u = EffectUniforms::default();
        u.pack_knobs(&EffectKnobs::Metallic(MetallicKnobs {
            brush_angle_deg: 90.0,
            ..MetallicKnobs::default()
        }));
        assert!((u.params[0] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(u.params[1], 180.0);
        assert_eq!(&u.params[4..7], &crate::effects::CHROME_TINT);
    }

    #[test]
    fn test_pack_clears_previous_kind() {
        let mut u = EffectUniforms::default();
        u.pack_knobs(&EffectKnobs::Galaxy(GalaxyKnobs::default()));
        assert_ne!(u.params[8], 0.0);
        u.pack_knobs(&EffectKnobs::defaults(EffectKind::Prismatic));
        assert_eq!(u.params[8], 0.0);
        assert_eq!(u.params[0], 1.5);
    }

    #[test]
    fn test_out_of_range_writes_ignored() {
        let mut u = EffectUniforms::default();
        u.set_float(PARAM_SLOTS, 1.0);
        u.set_vec3(PARAM_SLOTS - 2, [1.0; 3]);
        u.set_flag(9, true);
        assert!(u.params.iter().all(|v| *v == 0.0));
    }
}
