//! wgpu delegate for the host renderer
//!
//! The compositor itself is device-agnostic. This module holds what a wgpu
//! host needs to draw a [`RenderList`](crate::compositor::RenderList):
//!
//! - `DeviceCapabilities::from_adapter` for the session probe
//! - `GpuMaterialPipeline`: one pipeline per shader program and blend mode
//! - `GpuCardMesh`: the subdivided card face
//! - `GpuAtlasStore`: GPU copies of the procedural atlases

mod mesh;
mod pipeline;
mod texture;

pub use mesh::*;
pub use pipeline::*;
pub use texture::*;

use crate::quality::{DeviceCapabilities, FragmentPrecision};

impl DeviceCapabilities {
    /// Probe an adapter once per session.
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        let caps = Self::from_limits(adapter.limits().max_texture_dimension_2d, downlevel.shader_model);

        tracing::info!(
            target: "foilcard::gpu",
            adapter = %info.name,
            backend = ?info.backend,
            max_texture_size = caps.max_texture_size,
            shader_pipeline = caps.supports_shader_pipeline,
            precision = ?caps.fragment_precision,
            "Probed device capabilities"
        );
        caps
    }

    /// Capabilities from raw adapter limits.
    pub fn from_limits(max_texture_dimension_2d: u32, shader_model: wgpu::ShaderModel) -> Self {
        let (supports_shader_pipeline, fragment_precision) = match shader_model {
            wgpu::ShaderModel::Sm2 => (false, FragmentPrecision::Lowp),
            wgpu::ShaderModel::Sm4 => (true, FragmentPrecision::Mediump),
            wgpu::ShaderModel::Sm5 => (true, FragmentPrecision::Highp),
        };
        Self {
            supports_shader_pipeline,
            max_texture_size: max_texture_dimension_2d,
            fragment_precision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityTier;

    #[test]
    fn test_capabilities_from_limits() {
        let desktop = DeviceCapabilities::from_limits(8192, wgpu::ShaderModel::Sm5);
        assert_eq!(desktop.tier_ceiling(), QualityTier::Ultra);

        let gles = DeviceCapabilities::from_limits(2048, wgpu::ShaderModel::Sm4);
        assert!(gles.supports_shader_pipeline);
        assert_eq!(gles.tier_ceiling(), QualityTier::Ultra);

        let small = DeviceCapabilities::from_limits(1024, wgpu::ShaderModel::Sm4);
        assert_eq!(small.tier_ceiling(), QualityTier::Medium);

        let legacy = DeviceCapabilities::from_limits(4096, wgpu::ShaderModel::Sm2);
        assert_eq!(legacy.tier_ceiling(), QualityTier::Low);
    }
}
