//! Merging per-hexagon geometry into draw-ready meshes.

use std::num::NonZeroUsize;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;

use crate::math;
use crate::topology::{HexGeometry, INDICES_PER_HEXAGON, VERTICES_PER_HEXAGON};

/// Concatenated vertices and indices of consecutive hexagon instances.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchedMesh {
    /// Vertex positions, 35 per instance, in instance order.
    pub vertices: Vec<Vec3>,
    /// Triangle indices into `vertices`.
    pub triangles: Vec<u32>,
}

impl BatchedMesh {
    /// Empty buffers sized for `instances` hexagons.
    pub fn with_capacity(instances: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(instances * VERTICES_PER_HEXAGON),
            triangles: Vec::with_capacity(instances * INDICES_PER_HEXAGON),
        }
    }

    /// Number of hexagons merged so far.
    pub fn instance_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_HEXAGON
    }

    /// True when no hexagon has been merged.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends one hexagon as the next instance of this batch.
    ///
    /// A batch holds at most [`MAX_HEXAGONS`](crate::topology::MAX_HEXAGONS) instances.
    pub fn push(&mut self, geometry: &HexGeometry) {
        let slot = self.instance_count() as u32;
        self.vertices.extend_from_slice(&geometry.vertices);
        self.triangles.extend(geometry.triangles_at(slot));
    }

    /// Per-vertex normals recomputed from the triangle winding.
    pub fn normals(&self) -> Vec<Vec3> {
        math::vertex_normals(&self.vertices, &self.triangles)
    }

    /// Renderable triangle-list mesh with positions, normals and `u32` indices.
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.to_array()).collect();
        let normals: Vec<[f32; 3]> = self.normals().iter().map(|n| n.to_array()).collect();

        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(self.triangles.clone()))
    }
}

impl<'a> FromIterator<&'a HexGeometry> for BatchedMesh {
    fn from_iter<I: IntoIterator<Item = &'a HexGeometry>>(iter: I) -> Self {
        let mut batch = Self::default();
        for geometry in iter {
            batch.push(geometry);
        }
        batch
    }
}

/// Streams hexagon geometry into chunked [`BatchedMesh`]es.
///
/// A chunk is closed once it holds `chunk_size` instances; with no chunk size
/// every instance lands in a single mesh.
#[derive(Debug)]
pub struct MeshBatcher {
    chunk_size: Option<NonZeroUsize>,
    current: BatchedMesh,
    finished: Vec<BatchedMesh>,
}

impl MeshBatcher {
    /// Batcher closing a chunk every `chunk_size` instances.
    pub fn new(chunk_size: Option<NonZeroUsize>) -> Self {
        Self {
            chunk_size,
            current: Self::fresh_chunk(chunk_size),
            finished: Vec::new(),
        }
    }

    fn fresh_chunk(chunk_size: Option<NonZeroUsize>) -> BatchedMesh {
        chunk_size
            .map(|k| BatchedMesh::with_capacity(k.get()))
            .unwrap_or_default()
    }

    /// Appends the next hexagon in placement order.
    pub fn push(&mut self, geometry: &HexGeometry) {
        self.current.push(geometry);
        if let Some(k) = self.chunk_size
            && self.current.instance_count() == k.get()
        {
            let full = std::mem::replace(&mut self.current, Self::fresh_chunk(self.chunk_size));
            self.finished.push(full);
        }
    }

    /// Closes the open chunk and returns every mesh in order.
    ///
    /// A trailing chunk with no instances is dropped, so no input means no meshes.
    pub fn finish(mut self) -> Vec<BatchedMesh> {
        if !self.current.is_empty() {
            self.finished.push(self.current);
        }
        self.finished
    }
}

/// Merges hexagons, in order, into `ceil(n / chunk_size)` meshes.
pub fn combine(geometries: &[HexGeometry], chunk_size: Option<NonZeroUsize>) -> Vec<BatchedMesh> {
    let mut batcher = MeshBatcher::new(chunk_size);
    for geometry in geometries {
        batcher.push(geometry);
    }
    batcher.finish()
}
