use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::post_process::bloom::{Bloom, BloomCompositeMode};
use bevy::prelude::*;
use bevy::render::view::Hdr;

use super::CameraConfig;
use super::entities::TerrainCamera;

/// Spawns the Camera3d entity with HDR, tonemapping and bloom.
pub fn spawn_camera(mut commands: Commands, cfg: Res<CameraConfig>) {
    let rig = TerrainCamera {
        focus: Vec3::ZERO,
        distance: cfg.start_distance,
    };
    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        Hdr,
        Tonemapping::TonyMcMapface,
        Bloom {
            intensity: cfg.bloom_intensity,
            composite_mode: BloomCompositeMode::Additive,
            ..Bloom::NATURAL
        },
        rig.transform(cfg.pitch),
        rig,
    ));
}

pub fn spawn_sun(mut commands: Commands) {
    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

/// WASD pans the focus point, Q/E and the wheel change the distance.
pub fn pan_and_zoom(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mut scroll: MessageReader<MouseWheel>,
    cfg: Res<CameraConfig>,
    mut query: Query<(&mut Transform, &mut TerrainCamera)>,
) {
    let Ok((mut transform, mut rig)) = query.single_mut() else {
        return;
    };
    let dt = time.delta_secs();

    // The view looks toward -Z, so W pans that way.
    let mut direction = Vec3::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        direction -= Vec3::Z;
    }
    if keys.pressed(KeyCode::KeyS) {
        direction += Vec3::Z;
    }
    if keys.pressed(KeyCode::KeyD) {
        direction += Vec3::X;
    }
    if keys.pressed(KeyCode::KeyA) {
        direction -= Vec3::X;
    }
    if direction != Vec3::ZERO {
        // Pan faster when zoomed out.
        let speed = cfg.move_speed * rig.distance / cfg.start_distance;
        rig.focus += direction.normalize() * speed * dt;
    }

    if keys.pressed(KeyCode::KeyE) {
        rig.distance -= cfg.zoom_speed * dt;
    }
    if keys.pressed(KeyCode::KeyQ) {
        rig.distance += cfg.zoom_speed * dt;
    }
    for ev in scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / 40.0,
        };
        rig.distance -= lines * cfg.scroll_sensitivity;
    }
    rig.distance = rig.distance.clamp(cfg.min_distance, cfg.max_distance);

    *transform = rig.transform(cfg.pitch);
}
