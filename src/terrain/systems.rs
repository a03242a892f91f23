use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PrimaryWindow;
use bevy_egui::egui;
use hex_prism_terrain::rebuild::{BuildState, IncrementalBuild};
use hex_prism_terrain::sampler::NoiseHeightmap;

use super::TerrainConfig;
use super::entities::{
    ActiveBuild, HeightmapPreview, TerrainBuild, TerrainChunk, TerrainMaterials, TerrainTiles,
};
use crate::camera::TerrainCamera;

// ── Startup ─────────────────────────────────────────────────────────

/// Inserts [`TerrainMaterials`].
pub fn setup_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let terrain = materials.add(StandardMaterial {
        base_color: Color::srgb(0.32, 0.52, 0.38),
        emissive: LinearRgba::rgb(0.01, 0.02, 0.03),
        perceptual_roughness: 0.9,
        ..default()
    });
    commands.insert_resource(TerrainMaterials { terrain });
}

// ── Update: rebuild triggers ───────────────────────────────────────

/// `R` rebuilds with the current settings, `N` advances the noise seed.
///
/// Both go through change detection on [`TerrainConfig`], like inspector edits.
pub fn rebuild_on_key(keys: Res<ButtonInput<KeyCode>>, mut cfg: ResMut<TerrainConfig>) {
    if keys.just_pressed(KeyCode::KeyR) {
        cfg.set_changed();
    }
    if keys.just_pressed(KeyCode::KeyN) {
        cfg.noise.seed = cfg.noise.seed.wrapping_add(1);
        info!("noise seed {}", cfg.noise.seed);
    }
}

/// Supersedes any running build and queues a new one.
pub fn request_rebuild(
    cfg: Res<TerrainConfig>,
    mut build: ResMut<TerrainBuild>,
    mut clear: ResMut<ClearColor>,
) {
    if build.state.is_building() {
        info!("superseding the running terrain build");
    }
    let ticket = build.generation.begin();
    debug!("terrain rebuild requested (generation {})", ticket.generation());
    build.pending = Some(ticket);
    clear.0 = cfg.clear_color;
}

// ── Update: time-sliced build ──────────────────────────────────────

/// Spawns up to `chunks_per_frame` chunks of the running build.
///
/// A superseded build has its chunks despawned. A finished one becomes the
/// visible terrain and every chunk of older generations is despawned.
pub fn emit_chunks(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Res<TerrainMaterials>,
    cfg: Res<TerrainConfig>,
    mut build: ResMut<TerrainBuild>,
    mut chunks: Query<(Entity, &TerrainChunk, &mut Visibility)>,
) {
    let build = &mut *build;
    let Some(active) = build.active.as_mut() else {
        return;
    };
    let generation = active.job.ticket().generation();
    let visibility = if active.progressive {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    // Not visible to `chunks` until the commands are applied.
    let mut spawned = Vec::new();

    for _ in 0..cfg.build.chunks_per_frame.max(1) {
        match active.job.next_chunk() {
            Some(Ok(mesh)) => {
                let index = active.job.emitted() - 1;
                let entity = commands
                    .spawn((
                        Name::new(format!("TerrainChunk({generation},{index})")),
                        TerrainChunk { generation, index },
                        Mesh3d(meshes.add(mesh.to_mesh())),
                        MeshMaterial3d(materials.terrain.clone()),
                        Transform::default(),
                        visibility,
                    ))
                    .id();
                spawned.push(entity);
            }
            Some(Err(err)) => {
                info!("{err}; discarding its chunks");
                build.state = BuildState::Cancelled { generation };
                break;
            }
            None => break,
        }
    }

    if let BuildState::Cancelled { generation } = build.state {
        for (entity, chunk, _) in &chunks {
            if chunk.generation == generation {
                commands.entity(entity).despawn();
            }
        }
        for entity in spawned {
            commands.entity(entity).despawn();
        }
        build.active = None;
        build.state = BuildState::Idle;
        return;
    }

    if !active.job.is_finished() {
        build.state = active.job.state();
        return;
    }

    for (entity, chunk, mut visibility) in &mut chunks {
        if chunk.generation == generation {
            *visibility = Visibility::Inherited;
        } else {
            commands.entity(entity).despawn();
        }
    }
    for entity in spawned {
        commands.entity(entity).insert(Visibility::Inherited);
    }
    info!(
        "terrain generation {generation} ready: {} hexagons in {} chunk(s)",
        active.job.centers().len(),
        active.job.chunk_count()
    );
    commands.insert_resource(TerrainTiles::new(&active.grid, active.job.centers()));
    build.active = None;
    build.state = BuildState::Idle;
}

/// Starts the queued build once the previous one has drained.
///
/// Rejected configurations are logged and the current terrain stays up.
#[allow(clippy::too_many_arguments)]
pub fn start_pending_build(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    cfg: Res<TerrainConfig>,
    mut build: ResMut<TerrainBuild>,
    chunks: Query<Entity, With<TerrainChunk>>,
    previews: Query<Entity, With<HeightmapPreview>>,
) {
    if build.active.is_some() {
        return;
    }
    let Some(ticket) = build.pending.take() else {
        return;
    };

    let heightmap = match NoiseHeightmap::for_grid(&cfg.grid, &cfg.noise) {
        Ok(heightmap) => heightmap,
        Err(err) => {
            error!("terrain configuration rejected: {err}");
            return;
        }
    };
    let job = match IncrementalBuild::start(&cfg.grid, &heightmap, ticket) {
        Ok(job) => job,
        Err(err) => {
            error!("terrain build failed: {err}");
            return;
        }
    };

    for entity in &previews {
        commands.entity(entity).despawn();
    }
    if cfg.build.show_preview {
        let side = cfg.grid.grid_scale as f32;
        let material = materials.add(StandardMaterial {
            base_color_texture: Some(images.add(heightmap_image(&heightmap))),
            unlit: true,
            ..default()
        });
        commands.spawn((
            Name::new("HeightmapPreview"),
            HeightmapPreview,
            Mesh3d(meshes.add(Plane3d::default().mesh().size(side, side))),
            MeshMaterial3d(material),
            Transform::from_xyz(0.0, -cfg.build.preview_depth, 0.0),
        ));
    }

    if cfg.build.progressive {
        for entity in &chunks {
            commands.entity(entity).despawn();
        }
    }

    build.state = job.state();
    build.active = Some(ActiveBuild {
        job,
        grid: cfg.grid.clone(),
        progressive: cfg.build.progressive,
    });
}

// ── Update: debug overlay ──────────────────────────────────────────

/// Labels the tile under the cursor with its hex coordinate and height.
pub fn label_hovered_tile(
    mut egui_ctx: Query<&mut bevy_egui::EguiContext>,
    camera_q: Query<(&Camera, &GlobalTransform), With<TerrainCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    tiles: Option<Res<TerrainTiles>>,
    mut ready: Local<bool>,
) {
    // egui is not ready on the first frame
    if !*ready {
        *ready = true;
        return;
    }
    let Some(tiles) = tiles else { return };
    let Ok((camera, cam_gt)) = camera_q.single() else {
        return;
    };
    let Some(cursor) = windows.single().ok().and_then(Window::cursor_position) else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(cam_gt, cursor) else {
        return;
    };
    let Some(distance) = ray.intersect_plane(Vec3::ZERO, InfinitePlane3d::new(Vec3::Y)) else {
        return;
    };
    let hit = ray.get_point(distance);
    let Some(center) = tiles.at(Vec2::new(hit.x, hit.z)) else {
        return;
    };
    let Ok(viewport) = camera.world_to_viewport(cam_gt, center.position()) else {
        return;
    };
    let Ok(mut ctx) = egui_ctx.single_mut() else {
        return;
    };

    let painter = ctx.get_mut().layer_painter(egui::LayerId::background());
    painter.text(
        egui::pos2(viewport.x, viewport.y),
        egui::Align2::CENTER_BOTTOM,
        format!("({}, {})  h={:.2}", center.hex.x, center.hex.y, center.height),
        egui::FontId::proportional(13.0),
        egui::Color32::WHITE,
    );
}

// ── Pure helpers ───────────────────────────────────────────────────

/// Grayscale RGBA texture of the heightmap.
fn heightmap_image(heightmap: &NoiseHeightmap) -> Image {
    let data = heightmap
        .to_luma8()
        .into_iter()
        .flat_map(|l| [l, l, l, u8::MAX])
        .collect();
    Image::new(
        Extent3d {
            width: heightmap.width(),
            height: heightmap.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    )
}
