//! GPU texture uploads for atlases and placeholder inputs

use std::collections::HashMap;

use crate::atlas::{AtlasKey, ProceduralAtlas};

/// A sampled RGBA8 texture and its default view.
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuTexture {
    /// Upload tightly packed RGBA8 pixels.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// 1x1 mid-grey texture bound where the host supplied no input
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba(device, queue, "Card Placeholder Texture", 1, 1, &[128, 128, 128, 255])
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// GPU copies of cached procedural atlases.
///
/// Mirrors the CPU [`AtlasCache`](crate::atlas::AtlasCache). Each frame,
/// pass `RenderList::released_atlases` to [`GpuAtlasStore::release`] before
/// uploading the list's atlas, and the keys from `CardCompositor::dispose`
/// on teardown.
#[derive(Default)]
pub struct GpuAtlasStore {
    textures: HashMap<AtlasKey, GpuTexture>,
}

impl GpuAtlasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The GPU texture for `atlas`, uploading it on first use
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, atlas: &ProceduralAtlas) -> &GpuTexture {
        self.textures.entry(atlas.key()).or_insert_with(|| {
            tracing::debug!(target: "foilcard::gpu", size = atlas.size(), "Uploading procedural atlas");
            GpuTexture::from_rgba(
                device,
                queue,
                "Procedural Atlas",
                atlas.size(),
                atlas.size(),
                atlas.image().as_raw(),
            )
        })
    }

    pub fn get(&self, key: &AtlasKey) -> Option<&GpuTexture> {
        self.textures.get(key)
    }

    /// Destroy the GPU copies of released atlases
    pub fn release(&mut self, keys: &[AtlasKey]) {
        for key in keys {
            if let Some(texture) = self.textures.remove(key) {
                texture.destroy();
            }
        }
    }

    pub fn dispose(&mut self) {
        for (_, texture) in self.textures.drain() {
            texture.destroy();
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
