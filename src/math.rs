//! Geometry and noise helpers shared by the sampler and the mesh stages.

use bevy::prelude::{Vec2, Vec3};

/// Maps a noise value from the standard `[-1, 1]` range into `[min, max]`.
///
/// Linear; values outside `[-1, 1]` map outside `[min, max]`.
///
/// # Examples
/// ```
/// # use hex_prism_terrain::math::map_noise_to_range;
/// assert_eq!(map_noise_to_range(-1.0, 0.0, 10.0), 0.0);
/// assert_eq!(map_noise_to_range( 1.0, 0.0, 10.0), 10.0);
/// assert_eq!(map_noise_to_range( 0.0, 2.0, 6.0),  4.0);
/// ```
pub fn map_noise_to_range(noise_val: f64, min: f32, max: f32) -> f32 {
    min + ((noise_val as f32 + 1.0) / 2.0) * (max - min)
}

/// Computes the face normal of a triangle defined by three vertices.
///
/// Uses the cross product of edges `(v1 - v0)` and `(v2 - v0)`.
/// Returns `Vec3::ZERO` if the triangle is degenerate (collinear points).
pub fn compute_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    edge1.cross(edge2).normalize_or_zero()
}

/// Per-vertex normals for an indexed triangle list.
///
/// Each vertex receives the normalized sum of the face normals of every
/// triangle that references it. Vertices referenced by no triangle, or only by
/// degenerate ones, get `Vec3::ZERO`.
pub fn vertex_normals(positions: &[Vec3], triangles: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = compute_normal(positions[a], positions[b], positions[c]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

/// Offset of corner `k` of a hexagon with circumradius 1, in the XZ plane.
///
/// Corner `k` sits at `60° * k`, so `k = 0` and `k = 6` coincide on +X.
pub fn hex_corner(k: u32) -> Vec2 {
    let radians = (60.0 * k as f32).to_radians();
    Vec2::new(radians.cos(), radians.sin())
}
