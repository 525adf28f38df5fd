//! Card surface mesh
//!
//! The card face is a subdivided plane so vertex-displacing effects
//! (secret rare emboss) have enough resolution to bend.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Vertex matching `VertexInput` in `common.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CardVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl CardVertex {
    /// Size of vertex in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Vertex buffer layout for wgpu
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU-side mesh data
#[derive(Debug, Clone)]
pub struct CardMesh {
    pub vertices: Vec<CardVertex>,
    pub indices: Vec<u32>,
}

impl CardMesh {
    /// Front face of a card centered on the origin, facing +Z.
    ///
    /// `segments` is the subdivision count along the shorter edge; the
    /// longer edge is scaled to keep cells roughly square.
    pub fn face(width: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(1);
        let (cols, rows) = if width <= height {
            let rows = ((segments as f32) * height / width.max(f32::EPSILON)).round() as u32;
            (segments, rows.max(1))
        } else {
            let cols = ((segments as f32) * width / height.max(f32::EPSILON)).round() as u32;
            (cols.max(1), segments)
        };

        let mut vertices = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
        for row in 0..=rows {
            let v = row as f32 / rows as f32;
            for col in 0..=cols {
                let u = col as f32 / cols as f32;
                vertices.push(CardVertex {
                    position: [(u - 0.5) * width, (0.5 - v) * height, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [u, v],
                });
            }
        }

        // Two CCW triangles per cell, viewed from +Z
        let stride = cols + 1;
        let mut indices = Vec::with_capacity((cols * rows * 6) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let top_left = row * stride + col;
                let top_right = top_left + 1;
                let bottom_left = top_left + stride;
                let bottom_right = bottom_left + 1;
                indices.extend_from_slice(&[top_left, bottom_left, top_right, top_right, bottom_left, bottom_right]);
            }
        }

        Self { vertices, indices }
    }
}

/// Uploaded mesh buffers
pub struct GpuCardMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuCardMesh {
    pub fn new(device: &wgpu::Device, mesh: &CardMesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Card Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Card Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_size() {
        assert_eq!(CardVertex::SIZE, 32);
    }

    #[test]
    fn test_face_grid() {
        let mesh = CardMesh::face(2.5, 3.5, 10);
        // 10 columns, 14 rows
        assert_eq!(mesh.vertices.len(), 11 * 15);
        assert_eq!(mesh.indices.len(), 10 * 14 * 6);
        let max_index = *mesh.indices.iter().max().unwrap();
        assert_eq!(max_index as usize, mesh.vertices.len() - 1);
    }

    #[test]
    fn test_face_bounds_and_uvs() {
        let mesh = CardMesh::face(2.5, 3.5, 4);
        let first = mesh.vertices.first().unwrap();
        let last = mesh.vertices.last().unwrap();
        assert_eq!(first.position, [-1.25, 1.75, 0.0]);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.position, [1.25, -1.75, 0.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
    }

    #[test]
    fn test_face_winding_faces_forward() {
        let mesh = CardMesh::face(1.0, 1.0, 1);
        let p = |i: u32| glam::Vec3::from(mesh.vertices[i as usize].position);
        let (a, b, c) = (p(mesh.indices[0]), p(mesh.indices[1]), p(mesh.indices[2]));
        assert!((b - a).cross(c - a).z > 0.0);
    }
}
