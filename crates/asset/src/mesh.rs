//! CPU-side mesh representation and the built-in cube.

/// Vertex with position/color/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], color: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}

/// 1/sqrt(3): corner of a unit cube projected onto the unit sphere.
const N: f32 = 0.577_350_27;

/// The 2x2x2 cube: 8 shared corner vertices, 36 indices, 2 triangles per
/// face. Corner normals point diagonally outward (smooth-shaded cube);
/// sharing corners means the triangle winding is mixed, so renderers must
/// not back-face cull this mesh.
pub fn unit_cube() -> MeshData {
    let vertices = vec![
        // back z=-1
        MeshVertex::new([-1.0, -1.0, -1.0], [1.0, 0.0, 0.0], [-N, -N, -N], [0.0, 0.0]),
        MeshVertex::new([1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [N, -N, -N], [1.0, 0.0]),
        MeshVertex::new([1.0, 1.0, -1.0], [0.0, 0.0, 1.0], [N, N, -N], [1.0, 1.0]),
        MeshVertex::new([-1.0, 1.0, -1.0], [1.0, 1.0, 0.0], [-N, N, -N], [0.0, 1.0]),
        // front z=+1
        MeshVertex::new([-1.0, -1.0, 1.0], [1.0, 0.0, 1.0], [-N, -N, N], [0.0, 0.0]),
        MeshVertex::new([1.0, -1.0, 1.0], [0.0, 1.0, 1.0], [N, -N, N], [1.0, 0.0]),
        MeshVertex::new([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [N, N, N], [1.0, 1.0]),
        MeshVertex::new([-1.0, 1.0, 1.0], [0.2, 0.2, 0.2], [-N, N, N], [0.0, 1.0]),
    ];
    let indices = vec![
        0, 1, 2, 2, 3, 0, // back
        4, 5, 6, 6, 7, 4, // front
        0, 4, 7, 7, 3, 0, // left
        1, 5, 6, 6, 2, 1, // right
        3, 2, 6, 6, 7, 3, // top
        0, 1, 5, 5, 4, 0, // bottom
    ];
    MeshData::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn cube_is_eight_corners_twelve_triangles() {
        let cube = unit_cube();
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn cube_normals_are_unit_length() {
        for v in unit_cube().vertices {
            let [x, y, z] = v.normal;
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cube_normals_point_away_from_center() {
        for v in unit_cube().vertices {
            let dot: f32 = v
                .position
                .iter()
                .zip(v.normal.iter())
                .map(|(p, n)| p * n)
                .sum();
            assert!(dot > 0.0);
        }
    }
}
