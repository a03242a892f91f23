//! Fixed vertex layout and triangle table of one hexagonal prism tile.
//!
//! Every tile has 35 vertices:
//!
//! | index  | point                                        |
//! |--------|----------------------------------------------|
//! | 0      | top-cap center                               |
//! | 1..=6  | top-cap corners at `60° * k`, `k = 1..=6`    |
//! | 7      | skirt ring A: center                         |
//! | 8..=13 | skirt ring A: top corners                    |
//! | 14     | skirt ring A: center at `y = 0`              |
//! | 15..=20| skirt ring A: corners at `y = 0`             |
//! | 21..=34| skirt ring B, same layout as ring A          |
//!
//! Side quads alternate between the two skirt rings, so neighbouring side faces
//! never share a vertex and recomputed normals stay flat per face.

use bevy::prelude::*;

use crate::math;
use crate::placement::HexCenter;

/// Vertices contributed by each hexagon.
pub const VERTICES_PER_HEXAGON: usize = 35;

/// Indices contributed by each hexagon (18 triangles).
pub const INDICES_PER_HEXAGON: usize = PRISM_TRIANGLES.len() * 3;

/// Most hexagons one index space holds: every index of instance `n - 1` fits in `u32`.
pub const MAX_HEXAGONS: usize =
    ((u32::MAX as u64 + 1) / VERTICES_PER_HEXAGON as u64) as usize;

const CAP_POINTS: usize = 7;
const RING_POINTS: usize = 2 * CAP_POINTS;

/// Triangles of a single prism in local vertex indices.
///
/// The top fan winds `(next, current, center)`, which faces +Y in a right-handed
/// Y-up frame; side quads face away from the center.
pub const PRISM_TRIANGLES: [[u32; 3]; 18] = [
    // Top cap
    [2, 1, 0],
    [3, 2, 0],
    [4, 3, 0],
    [5, 4, 0],
    [6, 5, 0],
    [1, 6, 0],
    // Side between corners 1 and 2
    [8, 9, 15],
    [15, 9, 16],
    // 2-3
    [23, 24, 30],
    [30, 24, 31],
    // 3-4
    [10, 11, 17],
    [17, 11, 18],
    // 4-5
    [25, 26, 32],
    [32, 26, 33],
    // 5-6
    [12, 13, 19],
    [19, 13, 20],
    // 6-1
    [27, 22, 34],
    [34, 22, 29],
];

/// Vertices and offset indices of one hexagon instance.
#[derive(Clone, Debug, PartialEq)]
pub struct HexGeometry {
    /// The 35 prism vertices in world space.
    pub vertices: [Vec3; VERTICES_PER_HEXAGON],
    /// 54 indices, each offset by `35 * instance`.
    pub triangles: [u32; INDICES_PER_HEXAGON],
    /// Position of this hexagon in the placement order.
    pub instance: u32,
}

impl HexGeometry {
    /// Indices re-based for a buffer in which this hexagon is the `slot`-th instance.
    ///
    /// `slot` must be below [`MAX_HEXAGONS`].
    pub fn triangles_at(&self, slot: u32) -> impl Iterator<Item = u32> + '_ {
        // Modular arithmetic: exact whenever the re-based index fits in u32.
        let from = self.instance.wrapping_mul(VERTICES_PER_HEXAGON as u32);
        let to = slot.wrapping_mul(VERTICES_PER_HEXAGON as u32);
        self.triangles
            .iter()
            .map(move |&t| t.wrapping_sub(from).wrapping_add(to))
    }
}

/// Builds prism geometry for hexagons of one circumradius.
#[derive(Clone, Debug)]
pub struct HexagonBuilder {
    corners: [Vec3; 6],
}

impl HexagonBuilder {
    /// Builder for hexagons with circumradius `hexagon_size`.
    pub fn new(hexagon_size: f32) -> Self {
        let corners = std::array::from_fn(|i| {
            let c = math::hex_corner(i as u32 + 1) * hexagon_size;
            Vec3::new(c.x, 0.0, c.y)
        });
        Self { corners }
    }

    /// Center followed by the six corners, all at the center's height.
    fn cap(&self, center: Vec3) -> [Vec3; CAP_POINTS] {
        std::array::from_fn(|i| match i {
            0 => center,
            _ => center + self.corners[i - 1],
        })
    }

    /// The 35 local vertices of a prism whose top cap is centered on `center`.
    pub fn vertices(&self, center: Vec3) -> [Vec3; VERTICES_PER_HEXAGON] {
        let top = self.cap(center);
        let base = self.cap(Vec3::new(center.x, 0.0, center.z));
        std::array::from_fn(|i| match i {
            0..CAP_POINTS => top[i],
            _ => {
                let j = (i - CAP_POINTS) % RING_POINTS;
                if j < CAP_POINTS {
                    top[j]
                } else {
                    base[j - CAP_POINTS]
                }
            }
        })
    }

    /// Geometry of the `instance`-th hexagon in placement order.
    ///
    /// `instance` must be below [`MAX_HEXAGONS`] for its indices to fit in `u32`.
    pub fn build(&self, center: &HexCenter, instance: u32) -> HexGeometry {
        debug_assert!((instance as usize) < MAX_HEXAGONS);
        let offset = instance.wrapping_mul(VERTICES_PER_HEXAGON as u32);
        let mut triangles = [0; INDICES_PER_HEXAGON];
        for (dst, &src) in triangles.iter_mut().zip(PRISM_TRIANGLES.as_flattened()) {
            *dst = src + offset;
        }
        HexGeometry {
            vertices: self.vertices(center.position()),
            triangles,
            instance,
        }
    }
}
