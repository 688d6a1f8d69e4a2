use glam::{Mat4, Vec3};

/// Axis-aligned bounding box in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Triangle geometry: positions, per-vertex normals, optional index list.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// First texture coordinate set (`TEXCOORD_0`); empty when the source has none.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list indices. `None` means every three positions form a triangle.
    pub indices: Option<Vec<u32>>,
    pub bounding_box: Option<Aabb>,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl MeshGeometry {
    pub fn new(positions: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> Self {
        Self {
            positions,
            indices,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(idx) => idx.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    fn triangles(&self) -> Vec<[usize; 3]> {
        match &self.indices {
            Some(idx) => idx
                .chunks_exact(3)
                .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
                .collect(),
            None => (0..self.positions.len() / 3)
                .map(|t| [t * 3, t * 3 + 1, t * 3 + 2])
                .collect(),
        }
    }

    /// Rebuild smooth vertex normals from triangle faces.
    /// Each vertex gets the normalized sum of the (area-weighted) normals of
    /// the faces that reference it. Triangles with out-of-range indices are skipped.
    pub fn compute_vertex_normals(&mut self) {
        let count = self.positions.len();
        let mut acc = vec![Vec3::ZERO; count];

        for [a, b, c] in self.triangles() {
            if a >= count || b >= count || c >= count {
                continue;
            }
            let pa = Vec3::from(self.positions[a]);
            let pb = Vec3::from(self.positions[b]);
            let pc = Vec3::from(self.positions[c]);
            let face = (pc - pb).cross(pa - pb);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }

        self.normals = acc
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }

    pub fn compute_bounding_box(&mut self) {
        let mut iter = self.positions.iter().map(|p| Vec3::from(*p));
        self.bounding_box = iter.next().map(|first| {
            let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
            Aabb { min, max }
        });
    }

    /// Sphere centered on the bounding box center, enclosing every vertex.
    pub fn compute_bounding_sphere(&mut self) {
        if self.bounding_box.is_none() {
            self.compute_bounding_box();
        }
        self.bounding_sphere = self.bounding_box.map(|bb| {
            let center = bb.center();
            let radius_sq = self
                .positions
                .iter()
                .map(|p| center.distance_squared(Vec3::from(*p)))
                .fold(0.0f32, f32::max);
            BoundingSphere { center, radius: radius_sq.sqrt() }
        });
    }
}

/// Encoded image embedded in a model file (PNG, JPEG, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Surface appearance of a mesh: base color factor and optional base color map.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMaterial {
    pub name: String,
    /// Linear RGBA multiplier; white when the source sets none.
    pub base_color: [f32; 4],
    pub base_color_texture: Option<TextureImage>,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0; 4],
            base_color_texture: None,
        }
    }
}

/// A mesh-bearing node of a loaded model.
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Node name from the source file (may be empty).
    pub name: String,
    /// Transform from mesh space to model space.
    pub transform: Mat4,
    pub geometry: MeshGeometry,
    pub material: MeshMaterial,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, transform: Mat4, geometry: MeshGeometry) -> Self {
        Self {
            name: name.into(),
            transform,
            geometry,
            material: MeshMaterial::default(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_material(mut self, material: MeshMaterial) -> Self {
        self.material = material;
        self
    }

    /// Prepare the node for lit, shadowed rendering: recompute normals and
    /// bounding volumes and enable both shadow flags.
    pub fn normalize(&mut self) {
        self.cast_shadow = true;
        self.receive_shadow = true;
        self.geometry.compute_vertex_normals();
        self.geometry.compute_bounding_sphere();
        self.geometry.compute_bounding_box();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshGeometry {
        MeshGeometry::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            Some(vec![0, 1, 2, 0, 2, 3]),
        )
    }

    #[test]
    fn flat_quad_normals_point_up_z() {
        let mut geo = quad();
        geo.compute_vertex_normals();
        assert_eq!(geo.normals.len(), 4);
        for n in &geo.normals {
            assert!((n[2] - 1.0).abs() < 1e-6, "normal was {:?}", n);
        }
    }

    #[test]
    fn non_indexed_triangle_gets_face_normal() {
        let mut geo = MeshGeometry::new(
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
            None,
        );
        geo.compute_vertex_normals();
        for n in &geo.normals {
            assert!((n[1] - 1.0).abs() < 1e-6, "normal was {:?}", n);
        }
    }

    #[test]
    fn bounding_box_spans_positions() {
        let mut geo = quad();
        geo.compute_bounding_box();
        let bb = geo.bounding_box.unwrap();
        assert_eq!(bb.min, Vec3::ZERO);
        assert_eq!(bb.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(bb.center(), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn bounding_sphere_encloses_corners() {
        let mut geo = quad();
        geo.compute_bounding_sphere();
        let sphere = geo.bounding_sphere.unwrap();
        assert_eq!(sphere.center, Vec3::new(0.5, 0.5, 0.0));
        assert!((sphere.radius - 0.5f32.hypot(0.5)).abs() < 1e-6);
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        let mut geo = MeshGeometry::default();
        geo.compute_bounding_sphere();
        assert!(geo.bounding_box.is_none());
        assert!(geo.bounding_sphere.is_none());
    }

    #[test]
    fn normalize_sets_shadow_flags() {
        let mut node = MeshNode::new("ring", Mat4::IDENTITY, quad());
        assert!(!node.cast_shadow);
        node.normalize();
        assert!(node.cast_shadow && node.receive_shadow);
        assert_eq!(node.geometry.normals.len(), 4);
        assert!(node.geometry.bounding_box.is_some());
    }
}
