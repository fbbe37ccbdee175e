use super::mesh::MeshData;
use super::vertex::v;

pub const PLANE_SIZE: f32 = 14.0;
pub const PLANE_DIVISIONS: u32 = 80;

/// Flat grid in the XZ plane centred on the origin, facing +Y, with UVs
/// spanning [0, 1]. Triangles wind counter-clockwise seen from above.
pub fn plane_mesh(width: f32, depth: f32, x_steps: u32, z_steps: u32) -> MeshData {
    let x_steps = x_steps.max(1);
    let z_steps = z_steps.max(1);
    let mut vertices = Vec::with_capacity(((x_steps + 1) * (z_steps + 1)) as usize);
    let mut indices = Vec::with_capacity((x_steps * z_steps * 6) as usize);

    for row in 0..=z_steps {
        let tz = row as f32 / z_steps as f32;
        let z = -depth * 0.5 + depth * tz;
        for col in 0..=x_steps {
            let tx = col as f32 / x_steps as f32;
            let x = -width * 0.5 + width * tx;
            vertices.push(v([x, 0.0, z], [0.0, 1.0, 0.0], [tx, tz]));
        }
    }

    for row in 0..z_steps {
        for col in 0..x_steps {
            let current = row * (x_steps + 1) + col;
            let next = current + x_steps + 1;

            // Two triangles per quad
            indices.push(current);
            indices.push(next);
            indices.push(current + 1);

            indices.push(current + 1);
            indices.push(next);
            indices.push(next + 1);
        }
    }

    MeshData { vertices, indices }
}

/// The ground plane the pen casts its shadow on.
pub fn ground_plane() -> MeshData {
    plane_mesh(PLANE_SIZE, PLANE_SIZE, PLANE_DIVISIONS, PLANE_DIVISIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn ground_plane_counts_look_right() {
        let plane = ground_plane();
        assert_eq!(plane.vertices.len(), 81 * 81);
        assert_eq!(plane.triangle_count(), 80 * 80 * 2);
    }

    #[test]
    fn plane_spans_its_size() {
        let plane = ground_plane();
        let (min, max) = plane.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), vertex| {
                let p = Vec3::from(vertex.pos);
                (min.min(p), max.max(p))
            },
        );
        assert!(min.abs_diff_eq(Vec3::new(-7.0, 0.0, -7.0), 1e-5));
        assert!(max.abs_diff_eq(Vec3::new(7.0, 0.0, 7.0), 1e-5));
    }

    #[test]
    fn triangles_face_up() {
        let plane = plane_mesh(2.0, 2.0, 2, 2);
        for tri in plane.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(plane.vertices[i as usize].pos));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn uvs_cover_unit_square() {
        let plane = plane_mesh(1.0, 1.0, 4, 4);
        assert_eq!(plane.vertices[0].uv, [0.0, 0.0]);
        assert_eq!(plane.vertices.last().map(|vertex| vertex.uv), Some([1.0, 1.0]));
    }
}
