#![warn(missing_docs)]
//! Hexagonal prism terrain viewer.
//!
//! Builds the terrain from a noise heightmap, rebuilds it whenever the
//! configuration changes, and offers an inspector overlay on `Tab`.

mod camera;
#[cfg(feature = "native")]
mod cli;
mod terrain;

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy_inspector_egui::quick::ResourceInspectorPlugin;

use terrain::TerrainConfig;

/// Application-wide state, used for system scheduling.
#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash, Reflect)]
pub enum GameState {
    /// Camera and rebuild keys active.
    #[default]
    Running,
    /// Inspector overlay and tile labels active (Tab to toggle).
    Debugging,
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Hex Prism Terrain".into(),
            ..default()
        }),
        ..default()
    }))
    .register_type::<GameState>()
    .init_state::<GameState>()
    .add_plugins(bevy_egui::EguiPlugin::default())
    .add_plugins(terrain::TerrainPlugin(startup_config()))
    .add_plugins(camera::CameraPlugin(camera::CameraConfig::default()))
    .add_systems(Update, exit_on_esc)
    .add_systems(Update, toggle_inspector)
    .add_plugins(
        ResourceInspectorPlugin::<TerrainConfig>::default()
            .run_if(in_state(GameState::Debugging)),
    );

    app.run();
}

#[cfg(feature = "native")]
fn startup_config() -> TerrainConfig {
    use clap::Parser;

    let mut cfg = TerrainConfig::default();
    cli::Cli::parse().apply(&mut cfg);
    cfg
}

#[cfg(not(feature = "native"))]
fn startup_config() -> TerrainConfig {
    TerrainConfig::default()
}

fn toggle_inspector(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Tab) {
        next.set(match state.get() {
            GameState::Running => GameState::Debugging,
            GameState::Debugging => GameState::Running,
        });
    }
}

fn exit_on_esc(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
