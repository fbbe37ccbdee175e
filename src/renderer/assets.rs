//! Everything loaded from disk once at startup.

use std::path::Path;

use crate::error::ViewerError;
use crate::renderer::mesh::{GpuMesh, MeshData};
use crate::renderer::primitives::ground_plane;
use crate::renderer::texture::Texture;
use crate::scene::{MeshId, PARTS};

pub const GLOSS_MAP: &str = "images/gloss.png";
pub const ENVIRONMENT_DIR: &str = "images";
pub const ENVIRONMENT_EXTENSION: &str = "jpg";

pub struct SceneAssets {
    meshes: Vec<GpuMesh>,
    pub gloss: Texture,
    pub environment: Texture,
}

impl SceneAssets {
    /// Reads the four pen meshes, the gloss map and the environment cube from
    /// `root`, and generates the ground plane.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        root: &Path,
    ) -> Result<Self, ViewerError> {
        let mut meshes = Vec::with_capacity(MeshId::ALL.len());
        for part in PARTS {
            let data = MeshData::from_obj(root.join(part.path))?;
            meshes.push(GpuMesh::upload(device, &data, &format!("{:?}", part.mesh)));
        }
        meshes.push(GpuMesh::upload(device, &ground_plane(), "Plane"));

        let gloss = Texture::from_path(device, queue, root.join(GLOSS_MAP), false)?;
        let environment = Texture::cube_from_faces(
            device,
            queue,
            root.join(ENVIRONMENT_DIR),
            ENVIRONMENT_EXTENSION,
        )?;

        log::info!("Scene assets loaded from {:?}", root);

        Ok(Self {
            meshes,
            gloss,
            environment,
        })
    }

    pub fn mesh(&self, id: MeshId) -> &GpuMesh {
        &self.meshes[id.index()]
    }
}
