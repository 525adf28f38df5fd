//! Blend mode definitions and utilities
//!
//! Defines the blend modes an effect layer can be composited with, their
//! mapping to wgpu fixed-function blend state, and a CPU reference of the
//! blend math used for previews and tests.

use serde::{Deserialize, Serialize};

/// Blend modes for effect-layer compositing.
///
/// A blend mode is fixed per effect kind and is never user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlendMode {
    /// Porter-Duff source-over
    /// Result = Source × SourceAlpha + Dest × (1 - SourceAlpha)
    #[default]
    Normal,

    /// Result = Source × Dest
    Multiply,

    /// Result = 1 - (1 - Source) × (1 - Dest)
    Screen,

    /// Multiply in the darks, screen in the lights (keyed on Dest)
    Overlay,

    /// Result = Dest / (1 - Source)
    ColorDodge,

    /// Linear dodge
    /// Result = Source + Dest
    Additive,
}

impl BlendMode {
    /// Convert blend mode to wgpu BlendState for GPU rendering.
    ///
    /// The state expects the fragment output shaped by [`shader_output`]:
    /// screen and additive premultiply by opacity, multiply lerps towards
    /// white. Overlay and color dodge have no fixed-function equivalent, so
    /// the shader blends against the base itself and the result is laid
    /// over the destination with source-over.
    ///
    /// [`shader_output`]: BlendMode::shader_output
    pub fn to_blend_state(self) -> wgpu::BlendState {
        // Destination alpha accumulates coverage for every mode
        let alpha = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };
        let color = |src_factor: wgpu::BlendFactor, dst_factor: wgpu::BlendFactor| wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor,
                dst_factor,
                operation: wgpu::BlendOperation::Add,
            },
            alpha,
        };

        match self {
            BlendMode::Normal | BlendMode::Overlay | BlendMode::ColorDodge => wgpu::BlendState::ALPHA_BLENDING,
            // src·a + dst
            BlendMode::Additive => color(wgpu::BlendFactor::One, wgpu::BlendFactor::One),
            // lerp(1, src, a) · dst
            BlendMode::Multiply => color(wgpu::BlendFactor::Dst, wgpu::BlendFactor::Zero),
            // src·a + dst · (1 - src·a)
            BlendMode::Screen => color(wgpu::BlendFactor::One, wgpu::BlendFactor::OneMinusSrc),
        }
    }

    /// Whether the fragment shader has to blend against the base itself
    /// before `to_blend_state` is applied.
    pub fn needs_shader_assist(self) -> bool {
        matches!(self, BlendMode::Overlay | BlendMode::ColorDodge)
    }

    /// RGBA a fragment shader emits for this mode, given the effect color,
    /// the base color under it and the layer opacity.
    ///
    /// Feeding this through `to_blend_state` over `base` reproduces
    /// [`apply`](BlendMode::apply).
    pub fn shader_output(self, src: [f32; 3], base: [f32; 3], opacity: f32) -> [f32; 4] {
        let a = opacity.clamp(0.0, 1.0);
        let rgb = match self {
            BlendMode::Normal => src,
            BlendMode::Screen | BlendMode::Additive => src.map(|c| c * a),
            BlendMode::Multiply => src.map(|c| 1.0 + (c - 1.0) * a),
            BlendMode::Overlay | BlendMode::ColorDodge => {
                [0, 1, 2].map(|i| self.blend_channel(src[i], base[i]))
            }
        };
        [rgb[0], rgb[1], rgb[2], a]
    }

    /// Blend a single channel (`src` over `dst`, both 0-1) without opacity.
    pub fn blend_channel(self, src: f32, dst: f32) -> f32 {
        let value = match self {
            BlendMode::Normal => src,
            BlendMode::Multiply => src * dst,
            BlendMode::Screen => 1.0 - (1.0 - src) * (1.0 - dst),
            BlendMode::Overlay => {
                if dst < 0.5 {
                    2.0 * src * dst
                } else {
                    1.0 - 2.0 * (1.0 - src) * (1.0 - dst)
                }
            }
            BlendMode::ColorDodge => {
                if src >= 1.0 {
                    1.0
                } else {
                    dst / (1.0 - src)
                }
            }
            BlendMode::Additive => src + dst,
        };
        value.clamp(0.0, 1.0)
    }

    /// Blend an RGB source over an RGB destination with the given opacity.
    ///
    /// Additive adds the attenuated source and saturates once, so a faint
    /// layer over a bright destination still brightens it.
    pub fn apply(self, src: [f32; 3], dst: [f32; 3], opacity: f32) -> [f32; 3] {
        let opacity = opacity.clamp(0.0, 1.0);
        let mut out = [0.0; 3];
        for i in 0..3 {
            out[i] = match self {
                BlendMode::Additive => (dst[i] + src[i] * opacity).min(1.0),
                _ => {
                    let blended = self.blend_channel(src[i], dst[i]);
                    dst[i] + (blended - dst[i]) * opacity
                }
            };
        }
        out
    }

    /// Get a human-readable name for the blend mode
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::ColorDodge => "Color Dodge",
            BlendMode::Additive => "Additive",
        }
    }

    /// Get all available blend modes
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::ColorDodge,
            BlendMode::Additive,
        ]
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_blend_mode_default() {
        assert_eq!(BlendMode::default(), BlendMode::Normal);
    }

    #[test]
    fn test_blend_mode_display() {
        assert_eq!(format!("{}", BlendMode::ColorDodge), "Color Dodge");
        assert_eq!(format!("{}", BlendMode::Additive), "Additive");
    }

    #[test]
    fn test_blend_mode_all() {
        let all = BlendMode::all();
        assert_eq!(all.len(), 6);
        assert!(all.contains(&BlendMode::Overlay));
    }

    #[test]
    fn test_channel_math() {
        assert!(close(BlendMode::Multiply.blend_channel(0.5, 0.5), 0.25));
        assert!(close(BlendMode::Screen.blend_channel(0.5, 0.5), 0.75));
        assert!(close(BlendMode::Overlay.blend_channel(0.5, 0.25), 0.25));
        assert!(close(BlendMode::Overlay.blend_channel(0.5, 0.75), 0.75));
        assert!(close(BlendMode::ColorDodge.blend_channel(0.5, 0.25), 0.5));
        assert!(close(BlendMode::ColorDodge.blend_channel(1.0, 0.1), 1.0));
        assert!(close(BlendMode::Additive.blend_channel(0.7, 0.6), 1.0));
    }

    #[test]
    fn test_apply_zero_opacity_keeps_destination() {
        let dst = [0.2, 0.4, 0.6];
        for mode in BlendMode::all() {
            assert_eq!(mode.apply([1.0, 1.0, 1.0], dst, 0.0), dst);
        }
    }

    #[test]
    fn test_shader_assist_modes() {
        assert!(BlendMode::Overlay.needs_shader_assist());
        assert!(BlendMode::ColorDodge.needs_shader_assist());
        assert!(!BlendMode::Screen.needs_shader_assist());
    }

    fn factor(factor: wgpu::BlendFactor, src: [f32; 4], dst: f32, channel: usize) -> f32 {
        match factor {
            wgpu::BlendFactor::Zero => 0.0,
            wgpu::BlendFactor::One => 1.0,
            wgpu::BlendFactor::Src => src[channel],
            wgpu::BlendFactor::OneMinusSrc => 1.0 - src[channel],
            wgpu::BlendFactor::SrcAlpha => src[3],
            wgpu::BlendFactor::OneMinusSrcAlpha => 1.0 - src[3],
            wgpu::BlendFactor::Dst => dst,
            wgpu::BlendFactor::OneMinusDst => 1.0 - dst,
            other => panic!("unexpected blend factor {other:?}"),
        }
    }

    /// Fixed-function color equation over a unorm target
    fn hardware_blend(state: wgpu::BlendState, src: [f32; 4], dst: [f32; 3]) -> [f32; 3] {
        let c = state.color;
        assert_eq!(c.operation, wgpu::BlendOperation::Add);
        [0, 1, 2].map(|i| {
            let value = src[i] * factor(c.src_factor, src, dst[i], i) + dst[i] * factor(c.dst_factor, src, dst[i], i);
            value.clamp(0.0, 1.0)
        })
    }

    #[test]
    fn test_blend_state_matches_cpu_reference() {
        let sources = [[0.0, 0.3, 0.8], [1.0, 0.5, 0.95], [0.2, 0.9, 0.6]];
        let destinations = [[0.25, 0.6, 0.1], [0.9, 0.4, 0.75], [0.5, 0.05, 0.3]];
        let opacities = [0.0, 1e-4, 0.35, 0.5, 0.7, 0.75, 1.0];

        for mode in BlendMode::all() {
            for src in sources {
                for dst in destinations {
                    for opacity in opacities {
                        let emitted = mode.shader_output(src, dst, opacity);
                        let gpu = hardware_blend(mode.to_blend_state(), emitted, dst);
                        let cpu = mode.apply(src, dst, opacity);
                        for i in 0..3 {
                            assert!(
                                (gpu[i] - cpu[i]).abs() < 1e-4,
                                "{mode} src={src:?} dst={dst:?} opacity={opacity}: gpu={gpu:?} cpu={cpu:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_opacity_ceiling_reaches_hardware_blend() {
        // Full-white source over a dark pixel at each kind's ceiling
        let cases = [
            (BlendMode::Screen, 0.75, 0.8125),
            (BlendMode::Overlay, 0.7, 0.425),
            (BlendMode::ColorDodge, 0.85, 0.8875),
        ];
        for (mode, opacity, expected) in cases {
            let out = hardware_blend(mode.to_blend_state(), mode.shader_output([1.0; 3], [0.25; 3], opacity), [0.25; 3]);
            assert!((out[0] - expected).abs() < 1e-5, "{mode}: {}", out[0]);
        }
    }

    #[test]
    fn test_zero_opacity_leaves_destination_on_hardware() {
        let dst = [0.25, 0.5, 0.75];
        for mode in BlendMode::all() {
            let out = hardware_blend(mode.to_blend_state(), mode.shader_output([1.0; 3], dst, 0.0), dst);
            for i in 0..3 {
                assert!((out[i] - dst[i]).abs() < 1e-6, "{mode}");
            }
        }
    }

    #[test]
    fn test_additive_saturates_after_opacity() {
        let out = BlendMode::Additive.apply([0.8; 3], [0.6; 3], 0.25);
        assert!((out[0] - 0.8).abs() < 1e-6);
        let out = BlendMode::Additive.apply([0.8; 3], [0.6; 3], 1.0);
        assert_eq!(out[0], 1.0);
    }
}
