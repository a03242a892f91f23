//! Overview camera: pans over the grid with WASD and zooms with Q/E or the wheel.
//!
//! Spawns the Camera3d entity with bloom, plus the sun light.

mod entities;
mod systems;

pub use entities::TerrainCamera;

use bevy::prelude::*;

use crate::GameState;

/// Per-plugin configuration for the overview camera.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct CameraConfig {
    /// Pan speed in world-units per second at the starting distance.
    pub move_speed: f32,
    /// Q/E zoom speed in world-units per second.
    pub zoom_speed: f32,
    /// Distance change per scroll line.
    pub scroll_sensitivity: f32,
    /// Closest the camera gets to its focus point.
    pub min_distance: f32,
    /// Farthest the camera gets from its focus point.
    pub max_distance: f32,
    /// Initial distance from the grid center.
    pub start_distance: f32,
    /// Elevation of the view above the ground plane (radians).
    pub pitch: f32,
    /// Bloom post-processing intensity.
    pub bloom_intensity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            move_speed: 40.0,
            zoom_speed: 60.0,
            scroll_sensitivity: 6.0,
            min_distance: 5.0,
            max_distance: 600.0,
            start_distance: 120.0,
            pitch: 0.9,
            bloom_intensity: 0.15,
        }
    }
}

/// Overview camera with keyboard pan and zoom.
pub struct CameraPlugin(pub CameraConfig);

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<TerrainCamera>()
            .register_type::<CameraConfig>()
            .insert_resource(self.0.clone())
            .add_systems(Startup, (systems::spawn_camera, systems::spawn_sun))
            .add_systems(
                Update,
                systems::pan_and_zoom.run_if(in_state(GameState::Running)),
            );
    }
}
