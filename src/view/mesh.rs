use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::assets::{SkinnedMeshData, SkinnedVertex};

/// Floor vertex. `tangent.w` is the bitangent sign.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl SkinnedVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Uint16x4,
        4 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkinnedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// UV sphere. The seam column is duplicated so `u` runs 0..=1, and pole
    /// rows shift `u` by half a segment so each pole triangle samples its own
    /// texel column.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);

        let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            let u_offset = match iy {
                0 => 0.5 / w as f32,
                _ if iy == h => -0.5 / w as f32,
                _ => 0.0,
            };
            let (sin_theta, cos_theta) = (v * PI).sin_cos();

            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let (sin_phi, cos_phi) = (u * PI * 2.0).sin_cos();
                let normal = [-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                vertices.push(Vertex {
                    pos: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                    normal,
                    uv: [u + u_offset, v],
                    tangent: [sin_phi, 0.0, cos_phi, 1.0],
                });
            }
        }

        let row = w + 1;
        let mut indices = Vec::with_capacity((w * h * 6) as usize);
        for iy in 0..h {
            for ix in 0..w {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // Pole rows collapse to one triangle per quad
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != h - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        upload_indexed(device, "Floor", bytemuck::cast_slice(&self.vertices), &self.indices)
    }
}

impl SkinnedMeshData {
    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        upload_indexed(device, "Skinned", bytemuck::cast_slice(&self.vertices), &self.indices)
    }
}

fn upload_indexed(device: &wgpu::Device, label: &str, vertices: &[u8], indices: &[u32]) -> MeshBuffer {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Vertex Buffer")),
        contents: vertices,
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Index Buffer")),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    MeshBuffer { vertex_buffer, index_buffer, index_count: indices.len() as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_sphere_vertex_and_index_counts() {
        let mesh = Mesh::sphere(2.0, 32, 16);
        assert_eq!(mesh.vertices.len(), 33 * 17);
        // Two pole rows with one triangle per quad, the rest with two
        assert_eq!(mesh.indices.len(), (32 * 16 * 2 - 2 * 32) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_sphere_normals_are_unit_and_radial() {
        let mesh = Mesh::sphere(2.0, 32, 16);
        for v in &mesh.vertices {
            let n = Vec3::from(v.normal);
            let p = Vec3::from(v.pos);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!((p.length() - 2.0).abs() < 1e-5);
            assert!((p / 2.0 - n).length() < 1e-5);
            let t = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
            assert!(t.dot(n).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let mesh = Mesh::sphere(1.0, 8, 4);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].pos));
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_sphere_uv_range() {
        let mesh = Mesh::sphere(2.0, 32, 16);
        let top = &mesh.vertices[0];
        assert!((top.uv[0] - 0.5 / 32.0).abs() < 1e-6);
        assert_eq!(top.uv[1], 0.0);
        let last = mesh.vertices.last().unwrap();
        assert_eq!(last.uv[1], 1.0);
    }
}
