//! Terrain host: drives cancellable builds and spawns the resulting chunk meshes.
//!
//! Any change to [`TerrainConfig`] (startup insertion, CLI, inspector edits,
//! the `R`/`N` keys) queues a new build generation. Builds run a few chunks per
//! frame and either replace the old terrain at once or appear progressively.

mod entities;
mod systems;

use bevy::prelude::*;
use hex_prism_terrain::config::{GridConfig, NoiseSettings};

use crate::GameState;

/// Nested configuration for the terrain subsystem.
#[derive(Resource, Clone, Debug, Reflect)]
#[reflect(Resource)]
pub struct TerrainConfig {
    /// Grid layout, height filtering and chunking.
    pub grid: GridConfig,
    /// Heightmap noise.
    pub noise: NoiseSettings,
    /// How builds are scheduled and shown.
    pub build: BuildSettings,
    /// Background clear color.
    pub clear_color: Color,
}

/// Scheduling and presentation of terrain builds.
#[derive(Clone, Debug, Reflect)]
pub struct BuildSettings {
    /// Chunks merged and spawned per frame.
    pub chunks_per_frame: usize,
    /// Show chunks as they are built instead of swapping when complete.
    pub progressive: bool,
    /// Draw the heightmap on a plane below the grid.
    pub show_preview: bool,
    /// Distance of the preview plane below the tile bases.
    pub preview_depth: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            noise: NoiseSettings::default(),
            build: BuildSettings {
                chunks_per_frame: 4,
                progressive: false,
                show_preview: true,
                preview_depth: 0.05,
            },
            clear_color: Color::srgb(0.01, 0.01, 0.02),
        }
    }
}

/// Terrain plugin: rebuild triggers, time-sliced chunk spawning, debug labels.
pub struct TerrainPlugin(pub TerrainConfig);

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<TerrainConfig>()
            .register_type::<entities::TerrainChunk>()
            .register_type::<entities::HeightmapPreview>()
            .insert_resource(self.0.clone())
            .insert_resource(ClearColor(self.0.clear_color))
            .init_resource::<entities::TerrainBuild>()
            .add_systems(Startup, systems::setup_materials)
            .add_systems(
                Update,
                systems::rebuild_on_key.run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (
                    systems::request_rebuild.run_if(resource_changed::<TerrainConfig>),
                    systems::emit_chunks,
                    systems::start_pending_build,
                )
                    .chain()
                    .after(systems::rebuild_on_key),
            );

        app.add_systems(
            Update,
            systems::label_hovered_tile.run_if(in_state(GameState::Debugging)),
        );
    }
}
