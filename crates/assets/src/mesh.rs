use bytemuck::{Pod, Zeroable};

/// Interleaved vertex: position, texture coordinate, normal.
///
/// Layout matches the vertex loader: attribute 0 = 3 floats, 1 = 2 floats, 2 = 3 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

const fn v(position: [f32; 3], texcoord: [f32; 2], normal: [f32; 3]) -> Vertex {
    Vertex {
        position,
        texcoord,
        normal,
    }
}

/// Unit cube as a plain triangle list: 6 faces, 2 CCW triangles per face.
#[rustfmt::skip]
pub static CUBE_VERTICES: [Vertex; 36] = [
    // +Z
    v([-0.5, -0.5,  0.5], [0.0, 0.0], [0.0, 0.0,  1.0]),
    v([ 0.5, -0.5,  0.5], [1.0, 0.0], [0.0, 0.0,  1.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 1.0], [0.0, 0.0,  1.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 1.0], [0.0, 0.0,  1.0]),
    v([-0.5,  0.5,  0.5], [0.0, 1.0], [0.0, 0.0,  1.0]),
    v([-0.5, -0.5,  0.5], [0.0, 0.0], [0.0, 0.0,  1.0]),
    // -Z
    v([-0.5, -0.5, -0.5], [0.0, 0.0], [0.0, 0.0, -1.0]),
    v([-0.5,  0.5, -0.5], [1.0, 0.0], [0.0, 0.0, -1.0]),
    v([ 0.5,  0.5, -0.5], [1.0, 1.0], [0.0, 0.0, -1.0]),
    v([ 0.5,  0.5, -0.5], [1.0, 1.0], [0.0, 0.0, -1.0]),
    v([ 0.5, -0.5, -0.5], [0.0, 1.0], [0.0, 0.0, -1.0]),
    v([-0.5, -0.5, -0.5], [0.0, 0.0], [0.0, 0.0, -1.0]),
    // +X
    v([ 0.5, -0.5, -0.5], [0.0, 0.0], [ 1.0, 0.0, 0.0]),
    v([ 0.5,  0.5, -0.5], [1.0, 0.0], [ 1.0, 0.0, 0.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 1.0], [ 1.0, 0.0, 0.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 1.0], [ 1.0, 0.0, 0.0]),
    v([ 0.5, -0.5,  0.5], [0.0, 1.0], [ 1.0, 0.0, 0.0]),
    v([ 0.5, -0.5, -0.5], [0.0, 0.0], [ 1.0, 0.0, 0.0]),
    // -X
    v([-0.5, -0.5, -0.5], [0.0, 0.0], [-1.0, 0.0, 0.0]),
    v([-0.5, -0.5,  0.5], [1.0, 0.0], [-1.0, 0.0, 0.0]),
    v([-0.5,  0.5,  0.5], [1.0, 1.0], [-1.0, 0.0, 0.0]),
    v([-0.5,  0.5,  0.5], [1.0, 1.0], [-1.0, 0.0, 0.0]),
    v([-0.5,  0.5, -0.5], [0.0, 1.0], [-1.0, 0.0, 0.0]),
    v([-0.5, -0.5, -0.5], [0.0, 0.0], [-1.0, 0.0, 0.0]),
    // +Y
    v([-0.5,  0.5, -0.5], [0.0, 0.0], [0.0,  1.0, 0.0]),
    v([-0.5,  0.5,  0.5], [1.0, 0.0], [0.0,  1.0, 0.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 1.0], [0.0,  1.0, 0.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 1.0], [0.0,  1.0, 0.0]),
    v([ 0.5,  0.5, -0.5], [0.0, 1.0], [0.0,  1.0, 0.0]),
    v([-0.5,  0.5, -0.5], [0.0, 0.0], [0.0,  1.0, 0.0]),
    // -Y
    v([-0.5, -0.5, -0.5], [0.0, 0.0], [0.0, -1.0, 0.0]),
    v([ 0.5, -0.5, -0.5], [1.0, 0.0], [0.0, -1.0, 0.0]),
    v([ 0.5, -0.5,  0.5], [1.0, 1.0], [0.0, -1.0, 0.0]),
    v([ 0.5, -0.5,  0.5], [1.0, 1.0], [0.0, -1.0, 0.0]),
    v([-0.5, -0.5,  0.5], [0.0, 1.0], [0.0, -1.0, 0.0]),
    v([-0.5, -0.5, -0.5], [0.0, 0.0], [0.0, -1.0, 0.0]),
];

/// Read-only vertex store. Drawn as a non-indexed triangle list.
#[derive(Debug, Clone, Copy)]
pub struct MeshStore {
    vertices: &'static [Vertex],
}

impl MeshStore {
    pub fn new(vertices: &'static [Vertex]) -> Self {
        Self { vertices }
    }

    /// The built-in textured cube.
    pub fn cube() -> Self {
        Self::new(&CUBE_VERTICES)
    }

    pub fn vertices(&self) -> &'static [Vertex] {
        self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.vertex_count() / 3
    }

    /// Raw bytes for upload into a vertex buffer.
    pub fn as_bytes(&self) -> &'static [u8] {
        bytemuck::cast_slice(self.vertices)
    }

    /// Byte stride between consecutive vertices.
    pub const fn stride() -> usize {
        std::mem::size_of::<Vertex>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn cube_has_twelve_triangles() {
        let mesh = MeshStore::cube();
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn vertex_stride_is_eight_floats() {
        assert_eq!(MeshStore::stride(), 32);
        assert_eq!(MeshStore::cube().as_bytes().len(), 36 * 32);
    }

    #[test]
    fn triangles_wind_ccw_around_face_normal() {
        for tri in CUBE_VERTICES.chunks(3) {
            let n = cross(
                sub(tri[1].position, tri[0].position),
                sub(tri[2].position, tri[0].position),
            );
            assert!(dot(n, tri[0].normal) > 0.0, "clockwise triangle: {tri:?}");
        }
    }

    #[test]
    fn each_face_shares_one_normal() {
        for face in CUBE_VERTICES.chunks(6) {
            let normal = face[0].normal;
            assert!(face.iter().all(|v| v.normal == normal));
            for v in face {
                // every vertex lies on the face plane
                assert_eq!(dot(v.position, normal), 0.5);
            }
        }
    }
}
