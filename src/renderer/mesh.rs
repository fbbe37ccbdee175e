//! Indexed triangle meshes: OBJ loading and GPU upload.

use std::path::Path;

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::ViewerError;
use crate::renderer::vertex::{v, Vertex};

/// CPU-side triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Loads every model in an OBJ file into one triangulated, single-indexed
    /// mesh. Materials are ignored.
    pub fn from_obj(path: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        log::info!("Loading mesh: {:?}", path);

        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| ViewerError::Mesh {
            path: path.to_path_buf(),
            source,
        })?;

        let mut data = MeshData::default();
        for model in &models {
            data.append_obj(&model.mesh);
        }

        if data.indices.is_empty() {
            return Err(ViewerError::EmptyMesh {
                path: path.to_path_buf(),
            });
        }

        log::info!(
            "Mesh {:?}: {} vertices, {} triangles",
            path,
            data.vertices.len(),
            data.triangle_count()
        );
        Ok(data)
    }

    fn append_obj(&mut self, mesh: &tobj::Mesh) {
        let base = self.vertices.len() as u32;
        let count = mesh.positions.len() / 3;
        let has_normals = mesh.normals.len() == mesh.positions.len();
        let has_uvs = mesh.texcoords.len() / 2 == count;

        for i in 0..count {
            let pos = [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ];
            let normal = if has_normals {
                [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ]
            } else {
                [0.0; 3]
            };
            let uv = if has_uvs {
                [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0; 2]
            };
            self.vertices.push(v(pos, normal, uv));
        }

        let first_index = self.indices.len();
        self.indices.extend(mesh.indices.iter().map(|i| base + i));

        if !has_normals {
            log::debug!("OBJ mesh has no normals, generating them");
            generate_normals(
                &mut self.vertices[base as usize..],
                &self.indices[first_index..],
                base,
            );
        }
    }
}

/// Area-weighted vertex normals. `indices` address the full vertex list,
/// `vertices` starts at `base`.
pub fn generate_normals(vertices: &mut [Vertex], indices: &[u32], base: u32) {
    let mut accum = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let idx = [
            (tri[0] - base) as usize,
            (tri[1] - base) as usize,
            (tri[2] - base) as usize,
        ];
        let [a, b, c] = idx.map(|i| Vec3::from(vertices[i].pos));
        // Cross product length is twice the triangle area.
        let face = (b - a).cross(c - a);
        for i in idx {
            accum[i] += face;
        }
    }

    for (vertex, n) in vertices.iter_mut().zip(accum) {
        vertex.normal = n.normalize_or_zero().to_array();
    }
}

/// Vertex and index buffers for one mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}
