use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Triangle mesh with interleaved position + normal vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Six floats per vertex: position xyz followed by normal xyz.
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub const FLOATS_PER_VERTEX: usize = 6;

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Self::FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices
            .extend_from_slice(&[position.x, position.y, position.z]);
        self.vertices
            .extend_from_slice(&[normal.x, normal.y, normal.z]);
        index
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn push_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.push_triangle(a, b, c);
        self.push_triangle(a, c, d);
    }
}

/// Axis-aligned box centered on the origin.
pub fn box_mesh(width: f32, height: f32, depth: f32) -> MeshData {
    let (hw, hh, hd) = (width * 0.5, height * 0.5, depth * 0.5);
    let mut mesh = MeshData::default();

    // One face per normal so shading stays flat.
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (
            Vec3::Z,
            [
                Vec3::new(-hw, -hh, hd),
                Vec3::new(hw, -hh, hd),
                Vec3::new(hw, hh, hd),
                Vec3::new(-hw, hh, hd),
            ],
        ),
        (
            Vec3::NEG_Z,
            [
                Vec3::new(hw, -hh, -hd),
                Vec3::new(-hw, -hh, -hd),
                Vec3::new(-hw, hh, -hd),
                Vec3::new(hw, hh, -hd),
            ],
        ),
        (
            Vec3::X,
            [
                Vec3::new(hw, -hh, hd),
                Vec3::new(hw, -hh, -hd),
                Vec3::new(hw, hh, -hd),
                Vec3::new(hw, hh, hd),
            ],
        ),
        (
            Vec3::NEG_X,
            [
                Vec3::new(-hw, -hh, -hd),
                Vec3::new(-hw, -hh, hd),
                Vec3::new(-hw, hh, hd),
                Vec3::new(-hw, hh, -hd),
            ],
        ),
        (
            Vec3::Y,
            [
                Vec3::new(-hw, hh, hd),
                Vec3::new(hw, hh, hd),
                Vec3::new(hw, hh, -hd),
                Vec3::new(-hw, hh, -hd),
            ],
        ),
        (
            Vec3::NEG_Y,
            [
                Vec3::new(-hw, -hh, -hd),
                Vec3::new(hw, -hh, -hd),
                Vec3::new(hw, -hh, hd),
                Vec3::new(-hw, -hh, hd),
            ],
        ),
    ];

    for (normal, corners) in faces {
        let a = mesh.push_vertex(corners[0], normal);
        let b = mesh.push_vertex(corners[1], normal);
        let c = mesh.push_vertex(corners[2], normal);
        let d = mesh.push_vertex(corners[3], normal);
        mesh.push_quad(a, b, c, d);
    }
    mesh
}

/// UV sphere centered on the origin.
pub fn sphere_mesh(radius: f32, segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = MeshData::default();

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for segment in 0..=segments {
            let theta = TAU * segment as f32 / segments as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            mesh.push_vertex(normal * radius, normal);
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            mesh.push_triangle(a, b, a + 1);
            mesh.push_triangle(a + 1, b, b + 1);
        }
    }
    mesh
}

/// Cylinder around the y axis, swept over `arc` radians starting at theta 0.
/// A full cylinder uses `arc = TAU`; the chest lid uses `arc = PI`. End caps
/// are sector fans so partial sweeps stay closed on top and bottom.
pub fn cylinder_mesh(radius: f32, height: f32, segments: u32, arc: f32) -> MeshData {
    let segments = segments.max(3);
    let half = height * 0.5;
    let mut mesh = MeshData::default();

    // Curved wall.
    let mut wall = Vec::with_capacity(segments as usize + 1);
    for segment in 0..=segments {
        let theta = arc * segment as f32 / segments as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let normal = Vec3::new(cos_theta, 0.0, sin_theta);
        let top = mesh.push_vertex(Vec3::new(normal.x * radius, half, normal.z * radius), normal);
        let bottom = mesh.push_vertex(
            Vec3::new(normal.x * radius, -half, normal.z * radius),
            normal,
        );
        wall.push((top, bottom));
    }
    for pair in wall.windows(2) {
        let (top_a, bottom_a) = pair[0];
        let (top_b, bottom_b) = pair[1];
        mesh.push_quad(bottom_a, bottom_b, top_b, top_a);
    }

    // Sector caps.
    for (y, normal) in [(half, Vec3::Y), (-half, Vec3::NEG_Y)] {
        let center = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal);
        let mut rim = Vec::with_capacity(segments as usize + 1);
        for segment in 0..=segments {
            let theta = arc * segment as f32 / segments as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            rim.push(mesh.push_vertex(
                Vec3::new(cos_theta * radius, y, sin_theta * radius),
                normal,
            ));
        }
        for pair in rim.windows(2) {
            if normal.y > 0.0 {
                mesh.push_triangle(center, pair[1], pair[0]);
            } else {
                mesh.push_triangle(center, pair[0], pair[1]);
            }
        }
    }
    mesh
}

/// Flat extrusion of a closed outline along +z. The outline is triangulated
/// as a fan around its centroid, which is adequate for the gently concave
/// filigree profile this crate feeds it.
pub fn extrude_outline(outline: &[Vec2], depth: f32) -> MeshData {
    let mut mesh = MeshData::default();
    if outline.len() < 3 {
        return mesh;
    }

    let centroid = outline.iter().copied().sum::<Vec2>() / outline.len() as f32;
    let half = depth * 0.5;

    for (z, normal) in [(half, Vec3::Z), (-half, Vec3::NEG_Z)] {
        let center = mesh.push_vertex(Vec3::new(centroid.x, centroid.y, z), normal);
        let rim: Vec<u32> = outline
            .iter()
            .map(|p| mesh.push_vertex(Vec3::new(p.x, p.y, z), normal))
            .collect();
        for i in 0..rim.len() {
            let a = rim[i];
            let b = rim[(i + 1) % rim.len()];
            if normal.z > 0.0 {
                mesh.push_triangle(center, a, b);
            } else {
                mesh.push_triangle(center, b, a);
            }
        }
    }

    // Side walls between the two faces.
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[(i + 1) % outline.len()];
        let edge = b - a;
        let normal = Vec3::new(edge.y, -edge.x, 0.0).normalize_or_zero();
        let fa = mesh.push_vertex(Vec3::new(a.x, a.y, half), normal);
        let fb = mesh.push_vertex(Vec3::new(b.x, b.y, half), normal);
        let bb = mesh.push_vertex(Vec3::new(b.x, b.y, -half), normal);
        let ba = mesh.push_vertex(Vec3::new(a.x, a.y, -half), normal);
        mesh.push_quad(fa, fb, bb, ba);
    }
    mesh
}

/// Samples one cubic bezier segment, excluding the end point so chained
/// segments do not duplicate vertices.
pub fn sample_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, steps: u32, out: &mut Vec<Vec2>) {
    let steps = steps.max(1);
    for step in 0..steps {
        let t = step as f32 / steps as f32;
        let u = 1.0 - t;
        let point = p0 * (u * u * u)
            + p1 * (3.0 * u * u * t)
            + p2 * (3.0 * u * t * t)
            + p3 * (t * t * t);
        out.push(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_six_flat_faces() {
        let mesh = box_mesh(2.0, 1.0, 3.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn box_extents_match_dimensions() {
        let mesh = box_mesh(4.0, 2.2, 2.6);
        let xs: Vec<f32> = mesh
            .vertices
            .chunks(MeshData::FLOATS_PER_VERTEX)
            .map(|v| v[0])
            .collect();
        let max_x = xs.iter().cloned().fold(f32::MIN, f32::max);
        assert!((max_x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn sphere_normals_are_unit_length() {
        let mesh = sphere_mesh(0.06, 8, 8);
        for vertex in mesh.vertices.chunks(MeshData::FLOATS_PER_VERTEX) {
            let normal = Vec3::new(vertex[3], vertex[4], vertex[5]);
            assert!((normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn half_cylinder_stays_in_positive_sweep() {
        let mesh = cylinder_mesh(1.35, 4.0, 16, PI);
        for vertex in mesh.vertices.chunks(MeshData::FLOATS_PER_VERTEX) {
            // theta in [0, pi] keeps z non-negative on the wall and caps.
            assert!(vertex[2] >= -1e-4);
        }
    }

    #[test]
    fn extrusion_produces_watertight_triangle_budget() {
        let outline = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let mesh = extrude_outline(&outline, 0.05);
        // 4 fan triangles per face plus 2 per side wall.
        assert_eq!(mesh.triangle_count(), 4 * 2 + 4 * 2);
    }

    #[test]
    fn bezier_sampling_excludes_endpoint() {
        let mut points = Vec::new();
        sample_bezier(
            Vec2::ZERO,
            Vec2::new(0.5, 0.5),
            Vec2::new(1.0, 0.5),
            Vec2::new(1.5, 0.0),
            8,
            &mut points,
        );
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], Vec2::ZERO);
        assert!(points.last().unwrap().distance(Vec2::new(1.5, 0.0)) > 1e-3);
    }
}
