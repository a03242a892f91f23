use bevy::prelude::*;
use hex_prism_terrain::config::GridConfig;
use hex_prism_terrain::placement::{HexCenter, TileIndex};
use hex_prism_terrain::rebuild::{BuildGeneration, BuildState, BuildTicket, IncrementalBuild};

/// One combined mesh of a terrain build.
#[derive(Component, Reflect)]
pub struct TerrainChunk {
    /// Build generation that produced this chunk.
    pub generation: u64,
    /// Position of the chunk in the build's output order.
    pub index: usize,
}

/// Marker for the heightmap preview plane.
#[derive(Component, Reflect)]
pub struct HeightmapPreview;

/// Shared material handles for terrain chunks.
#[derive(Resource)]
pub struct TerrainMaterials {
    /// Surface material applied to every chunk mesh.
    pub terrain: Handle<StandardMaterial>,
}

/// Build bookkeeping: the generation counter, the queued request and the running job.
#[derive(Resource, Default)]
pub struct TerrainBuild {
    /// Source of build tickets; a new ticket supersedes the running build.
    pub generation: BuildGeneration,
    /// Where the current build is in its lifecycle.
    pub state: BuildState,
    /// Most recent request, started once the running job has drained.
    pub pending: Option<BuildTicket>,
    /// Job currently emitting chunks.
    pub active: Option<ActiveBuild>,
}

/// A running build with the settings it was started from.
pub struct ActiveBuild {
    /// Chunk source.
    pub job: IncrementalBuild,
    /// Grid the job was placed on, for the tile index built on completion.
    pub grid: GridConfig,
    /// Chunks are shown as they arrive.
    pub progressive: bool,
}

/// Placed tiles of the terrain currently on screen.
#[derive(Resource)]
pub struct TerrainTiles {
    /// Hexagon centers in instance order.
    pub centers: Vec<HexCenter>,
    /// Lookup from ground position to index into `centers`.
    pub index: TileIndex,
}

impl TerrainTiles {
    /// Tiles of a finished build.
    pub fn new(grid: &GridConfig, centers: &[HexCenter]) -> Self {
        Self {
            centers: centers.to_vec(),
            index: TileIndex::new(grid, centers),
        }
    }

    /// Center of the tile covering ground position `pos`.
    pub fn at(&self, pos: Vec2) -> Option<&HexCenter> {
        self.index.tile_at(pos).and_then(|i| self.centers.get(i))
    }
}
