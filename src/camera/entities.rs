use bevy::prelude::*;

/// Marker and orbit state of the overview camera.
#[derive(Component, Reflect)]
pub struct TerrainCamera {
    /// Ground point the camera looks at.
    pub focus: Vec3,
    /// Distance from `focus` along the view direction.
    pub distance: f32,
}

impl TerrainCamera {
    /// Camera transform looking down at `focus` from `pitch` radians above the ground.
    pub fn transform(&self, pitch: f32) -> Transform {
        let offset = Vec3::new(0.0, pitch.sin(), pitch.cos()) * self.distance;
        Transform::from_translation(self.focus + offset).looking_at(self.focus, Vec3::Y)
    }
}
